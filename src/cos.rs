use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use time::OffsetDateTime;

use crate::config::Config;
use crate::store::{ObjectItem, ObjectStore, RawListing, StoreError};

/// 腾讯云 COS 客户端，走 S3 兼容端点（也适用于 MinIO 等）。
/// 静态密钥在启动时解析一次，路径风格寻址。
pub struct CosStore {
    client: Client,
    bucket: String,
}

impl CosStore {
    pub fn new(cfg: &Config) -> Self {
        let credentials = Credentials::new(
            cfg.secret_id.clone(),
            cfg.secret_key.clone(),
            None,
            None,
            "quark-drive",
        );

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version_latest()
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(cfg.endpoint_url())
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: cfg.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for CosStore {
    async fn list_objects(
        &self,
        prefix: &str,
        delimiter: &str,
    ) -> Result<RawListing, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .delimiter(delimiter)
            .send()
            .await
            .map_err(|e| StoreError::List(e.to_string()))?;

        let common_prefixes = output
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        let contents = output
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                Some(ObjectItem {
                    key,
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: obj
                        .last_modified()
                        .and_then(|t| OffsetDateTime::from_unix_timestamp(t.secs()).ok()),
                })
            })
            .collect();

        Ok(RawListing {
            common_prefixes,
            contents,
        })
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StoreError::Put(e.to_string()))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::Delete(e.to_string()))?;
        Ok(())
    }

    async fn presigned_get_url(
        &self,
        key: &str,
        expires_secs: u64,
    ) -> Result<String, StoreError> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expires_secs))
            .map_err(|e| StoreError::Sign(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StoreError::Sign(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}
