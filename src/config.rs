use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

/// 命令行 / 环境变量配置，桶与密钥也可由 TOML 配置文件兜底
#[derive(Parser, Debug)]
#[command(name = "quark-drive", version, about = "夸克网盘风格的 COS 网页文件管理器")]
pub struct Args {
    /// TOML 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 监听地址
    #[arg(long, env = "QUARK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// 监听端口
    #[arg(short, long, env = "QUARK_PORT", default_value_t = 8080)]
    pub port: u16,

    /// 存储桶名称（COS 下形如 name-appid）
    #[arg(long, env = "COS_BUCKET")]
    pub bucket: Option<String>,

    /// 存储桶所在地域，例如 ap-guangzhou
    #[arg(long, env = "COS_REGION")]
    pub region: Option<String>,

    #[arg(long, env = "COS_SECRET_ID", hide_env_values = true)]
    pub secret_id: Option<String>,

    #[arg(long, env = "COS_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// 覆盖默认端点（MinIO / 其他 S3 兼容服务）
    #[arg(long, env = "COS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// 临时链接有效期（秒）
    #[arg(long, default_value_t = 3600)]
    pub link_expiry_secs: u64,

    /// 上传请求体上限（MiB）
    #[arg(long, default_value_t = 512)]
    pub upload_limit_mib: usize,

    /// 日志目录
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,
}

/// 配置文件允许出现的字段，全部可选
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    bucket: Option<String>,
    region: Option<String>,
    secret_id: Option<String>,
    secret_key: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub region: String,
    pub secret_id: String,
    pub secret_key: String,
    pub endpoint: Option<String>,
    pub link_expiry_secs: u64,
    pub upload_limit_mib: usize,
    pub log_dir: PathBuf,
}

impl Config {
    /// 命令行 / 环境变量优先，配置文件补缺
    pub fn resolve(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
                toml::from_str::<FileConfig>(&text)
                    .with_context(|| format!("解析配置文件失败: {}", path.display()))?
            }
            None => FileConfig::default(),
        };

        let Some(bucket) = args.bucket.or(file.bucket) else {
            bail!("缺少存储桶配置（--bucket 或 COS_BUCKET）");
        };
        let Some(region) = args.region.or(file.region) else {
            bail!("缺少地域配置（--region 或 COS_REGION）");
        };
        let Some(secret_id) = args.secret_id.or(file.secret_id) else {
            bail!("缺少密钥配置（--secret-id 或 COS_SECRET_ID）");
        };
        let Some(secret_key) = args.secret_key.or(file.secret_key) else {
            bail!("缺少密钥配置（--secret-key 或 COS_SECRET_KEY）");
        };

        Ok(Config {
            host: args.host,
            port: args.port,
            bucket,
            region,
            secret_id,
            secret_key,
            endpoint: args.endpoint.or(file.endpoint),
            link_expiry_secs: args.link_expiry_secs,
            upload_limit_mib: args.upload_limit_mib,
            log_dir: args.log_dir,
        })
    }

    /// S3 兼容端点，未显式指定时按地域推导 COS 端点
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(url) => url.clone(),
            None => format!("https://cos.{}.myqcloud.com", self.region),
        }
    }

    pub fn upload_limit_bytes(&self) -> usize {
        self.upload_limit_mib * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn bare_args() -> Args {
        Args {
            config: None,
            host: "0.0.0.0".into(),
            port: 8080,
            bucket: None,
            region: None,
            secret_id: None,
            secret_key: None,
            endpoint: None,
            link_expiry_secs: 3600,
            upload_limit_mib: 512,
            log_dir: "logs".into(),
        }
    }

    #[test]
    fn file_fills_missing_fields_and_args_win() {
        let mut file = tempfile::NamedTempFile::new().expect("创建临时配置文件失败");
        writeln!(
            file,
            r#"
bucket = "pan-1250000000"
region = "ap-guangzhou"
secret_id = "file-id"
secret_key = "file-key"
"#
        )
        .expect("写入配置失败");

        let mut args = bare_args();
        args.config = Some(file.path().to_path_buf());
        args.secret_id = Some("cli-id".into());

        let cfg = Config::resolve(args).expect("合并配置失败");
        assert_eq!(cfg.bucket, "pan-1250000000");
        assert_eq!(cfg.secret_id, "cli-id", "命令行应覆盖配置文件");
        assert_eq!(cfg.secret_key, "file-key");
    }

    #[test]
    fn missing_bucket_is_an_error() {
        let err = Config::resolve(bare_args()).unwrap_err();
        assert!(err.to_string().contains("存储桶"));
    }

    #[test]
    fn endpoint_defaults_to_cos_and_can_be_overridden() {
        let mut args = bare_args();
        args.bucket = Some("pan-1250000000".into());
        args.region = Some("ap-shanghai".into());
        args.secret_id = Some("id".into());
        args.secret_key = Some("key".into());

        let cfg = Config::resolve(args).expect("配置应合法");
        assert_eq!(cfg.endpoint_url(), "https://cos.ap-shanghai.myqcloud.com");

        let mut cfg = cfg;
        cfg.endpoint = Some("http://127.0.0.1:9000".into());
        assert_eq!(cfg.endpoint_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("创建临时配置文件失败");
        writeln!(file, "buckets = \"typo\"").expect("写入配置失败");

        let mut args = bare_args();
        args.config = Some(file.path().to_path_buf());
        assert!(Config::resolve(args).is_err());
    }
}
