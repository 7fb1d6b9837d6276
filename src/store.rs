use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use time::OffsetDateTime;

/// 后端 list 响应的原始形态：公共前缀（模拟目录）+ 对象条目。
/// 两半都可能为空，按空序列处理，不视为错误。
#[derive(Debug, Clone, Default)]
pub struct RawListing {
    pub common_prefixes: Vec<String>,
    pub contents: Vec<ObjectItem>,
}

#[derive(Debug, Clone)]
pub struct ObjectItem {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<OffsetDateTime>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("列取对象失败: {0}")]
    List(String),
    #[error("上传对象失败: {0}")]
    Put(String),
    #[error("删除对象失败: {0}")]
    Delete(String),
    #[error("签发临时链接失败: {0}")]
    Sign(String),
}

/// 存储后端抽象。本系统只消费四个操作，全部异步；
/// 以 trait 对象注入，测试时可换成内存实现。
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 按前缀 + 分隔符列取一层对象
    async fn list_objects(&self, prefix: &str, delimiter: &str)
        -> Result<RawListing, StoreError>;

    /// 覆盖写入对象，键冲突由后端语义决定（静默覆盖）
    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), StoreError>;

    async fn delete_object(&self, key: &str) -> Result<(), StoreError>;

    /// 签发限时只读链接
    async fn presigned_get_url(&self, key: &str, expires_secs: u64)
        -> Result<String, StoreError>;
}
