use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod config;
mod cos;
mod explorer;
mod html;
mod listing;
mod routes;
mod store;

use config::{Args, Config};
use cos::CosStore;
use explorer::Explorer;
use store::ObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 解析配置：命令行 / 环境变量优先，TOML 配置文件兜底
    let cfg = Config::resolve(Args::parse())?;

    // 2. 初始化日志：控制台 + 按天滚动的文件，guard 活到进程结束
    let file_appender = tracing_appender::rolling::daily(&cfg.log_dir, "quark-drive.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    // 3. 构建 COS 客户端和浏览状态
    let store: Arc<dyn ObjectStore> = Arc::new(CosStore::new(&cfg));
    let explorer = Arc::new(Explorer::new(store, cfg.link_expiry_secs));

    // 4. 启动服务
    let app = routes::router(explorer, &cfg);
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("监听地址无效")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("绑定 {addr} 失败"))?;

    info!(
        bucket = %cfg.bucket,
        region = %cfg.region,
        "服务已启动: http://{addr}"
    );
    if let Some(local_ip) = local_ip() {
        info!("局域网访问: http://{}:{}", local_ip, cfg.port);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("收到退出信号，正在关闭");
    }
}

// 获取本地IP地址（connect 不会真正发包）
fn local_ip() -> Option<String> {
    use std::net::{IpAddr, Ipv4Addr};

    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;

    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ipv4) if !ipv4.is_loopback() && ipv4 != Ipv4Addr::UNSPECIFIED => {
            Some(ipv4.to_string())
        }
        _ => None,
    }
}
