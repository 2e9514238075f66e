mod config;
mod error;
mod server;

use axum::serve;
use config::Config;
use error::{Result, StashError};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Stash application...");

    // 加载配置
    let config = Config::load()?;
    info!("Configuration loaded, data directory: {}", config.stash.data_dir.display());

    // 初始化应用状态
    let app_state = server::init_app_state(&config).await?;
    info!("Application state initialized");

    // 创建路由
    let app = server::create_router(app_state);

    // 启动HTTP服务器
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| StashError::Internal(format!("Invalid address: {}", e)))?;

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    serve(listener, app.into_make_service()).await?;

    Ok(())
}
