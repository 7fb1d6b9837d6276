use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::listing::{project, Entry};
use crate::store::ObjectStore;

/// 通知队列上限，旧通知被挤掉
const NOTICE_CAP: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// 一条瞬态通知，渲染一次后即被取走
#[derive(Debug, Clone)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Default)]
struct ViewState {
    prefix: String,
    entries: Vec<Entry>,
    loading: bool,
    /// 每次发起 list 请求递增；完成回调只在纪元仍匹配时生效，
    /// 慢响应覆盖新列表的竞态由此消除
    epoch: u64,
    notices: VecDeque<Notice>,
}

/// 渲染用的状态快照，取走当前积压的通知
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub prefix: String,
    pub entries: Vec<Entry>,
    pub loading: bool,
    pub notices: Vec<Notice>,
}

/// 导航状态 + 动作分发。后端以 trait 对象注入，锁不跨 await 持有。
pub struct Explorer {
    store: Arc<dyn ObjectStore>,
    link_expiry_secs: u64,
    state: Mutex<ViewState>,
}

impl Explorer {
    pub fn new(store: Arc<dyn ObjectStore>, link_expiry_secs: u64) -> Self {
        Self {
            store,
            link_expiry_secs,
            state: Mutex::new(ViewState::default()),
        }
    }

    pub fn current_prefix(&self) -> String {
        self.state.lock().prefix.clone()
    }

    /// 按键查当前列表中的条目
    pub fn entry(&self, key: &str) -> Option<Entry> {
        self.state
            .lock()
            .entries
            .iter()
            .find(|e| e.key() == key)
            .cloned()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let mut st = self.state.lock();
        ViewSnapshot {
            prefix: st.prefix.clone(),
            entries: st.entries.clone(),
            loading: st.loading,
            notices: st.notices.drain(..).collect(),
        }
    }

    pub fn notice_error(&self, text: impl Into<String>) {
        self.push(NoticeKind::Error, text.into());
    }

    /// 切换当前前缀并重新拉取。前缀不做存在性校验。
    pub async fn navigate(&self, prefix: &str) {
        {
            let mut st = self.state.lock();
            st.prefix = prefix.to_string();
        }
        self.refresh().await;
    }

    /// 重新拉取当前前缀下的列表。
    ///
    /// 失败时保留上一次的列表（stale-on-error），只追加一条错误通知；
    /// 响应到达时如果纪元已被更新的请求顶掉，则整体丢弃。
    pub async fn refresh(&self) {
        let (prefix, epoch) = {
            let mut st = self.state.lock();
            st.loading = true;
            st.epoch += 1;
            (st.prefix.clone(), st.epoch)
        };

        let result = self.store.list_objects(&prefix, "/").await;

        let mut st = self.state.lock();
        if st.epoch != epoch {
            // 过期响应，对应的导航已被取代
            return;
        }
        st.loading = false;
        match result {
            Ok(raw) => {
                st.entries = project(&raw, &prefix);
            }
            Err(e) => {
                error!(%prefix, "获取文件列表失败: {e}");
                Self::push_locked(&mut st, NoticeKind::Error, "获取文件列表失败".to_string());
            }
        }
    }

    /// 上传到当前前缀。对象键是前缀和文件名的直接拼接，
    /// 同名对象由后端静默覆盖。成功后重新拉取一次列表。
    pub async fn upload(&self, file_name: &str, body: Bytes) {
        let key = format!("{}{}", self.current_prefix(), file_name);
        match self.store.put_object(&key, body).await {
            Ok(()) => {
                info!(%key, "上传成功");
                self.push(NoticeKind::Success, format!("{file_name} 上传成功"));
                self.refresh().await;
            }
            Err(e) => {
                error!(%key, "上传失败: {e}");
                self.push(NoticeKind::Error, format!("{file_name} 上传失败"));
            }
        }
    }

    pub async fn delete(&self, key: &str) {
        match self.store.delete_object(key).await {
            Ok(()) => {
                info!(%key, "删除成功");
                self.push(NoticeKind::Success, "删除成功".to_string());
                self.refresh().await;
            }
            Err(e) => {
                error!(%key, "删除失败: {e}");
                self.push(NoticeKind::Error, "删除失败".to_string());
            }
        }
    }

    /// 为文件条目签发临时链接并以通知形式展示。
    /// 目录条目直接返回，不发请求也不产生通知。
    pub async fn temporary_url(&self, entry: &Entry) -> Option<String> {
        if entry.is_folder() {
            return None;
        }
        match self
            .store
            .presigned_get_url(entry.key(), self.link_expiry_secs)
            .await
        {
            Ok(url) => {
                info!(key = entry.key(), "临时链接已签发");
                self.push(NoticeKind::Success, format!("临时链接: {url}"));
                Some(url)
            }
            Err(e) => {
                error!(key = entry.key(), "获取临时链接失败: {e}");
                self.push(NoticeKind::Error, "获取临时链接失败".to_string());
                None
            }
        }
    }

    /// 在当前前缀下写入零长度的目录占位对象。
    /// 该占位对象正是投影时被过滤掉的那一条。
    pub async fn create_folder(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() || name.contains('/') {
            self.push(NoticeKind::Error, "文件夹名称无效".to_string());
            return;
        }
        let key = format!("{}{}/", self.current_prefix(), name);
        match self.store.put_object(&key, Bytes::new()).await {
            Ok(()) => {
                info!(%key, "文件夹已创建");
                self.push(NoticeKind::Success, format!("文件夹 {name} 创建成功"));
                self.refresh().await;
            }
            Err(e) => {
                error!(%key, "创建文件夹失败: {e}");
                self.push(NoticeKind::Error, format!("文件夹 {name} 创建失败"));
            }
        }
    }

    fn push(&self, kind: NoticeKind, text: String) {
        Self::push_locked(&mut self.state.lock(), kind, text);
    }

    fn push_locked(st: &mut ViewState, kind: NoticeKind, text: String) {
        if st.notices.len() == NOTICE_CAP {
            st.notices.pop_front();
        }
        st.notices.push_back(Notice {
            id: Uuid::new_v4(),
            kind,
            text,
        });
    }
}
