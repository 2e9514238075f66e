use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use stash_api::SystemSettingStore;
use stash_infra::{
    security::JwtService, LocalAttachmentStorage, MemoryNoteStore, MemoryResourceStore, MemoryStorageRegistry,
    MemorySystemSettingStore, S3ObjectStorageConnector,
};
use stash_service::resource::thumbnail::THUMBNAIL_CACHE_DIR;
use stash_service::{
    BlobPersister, ConcurrencyGate, DefaultThumbnailService, ResourceDeliveryService, ResourceService,
};
use stash_web::AppState;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::Result;

/// 创建应用路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(stash_web::resource_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// 健康检查端点
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 初始化应用状态
pub async fn init_app_state(config: &Config) -> Result<AppState> {
    let stash = &config.stash;
    tokio::fs::create_dir_all(&stash.data_dir).await?;

    // 系统设置与远程存储
    let settings = Arc::new(MemorySystemSettingStore::new());
    for (name, value) in &stash.settings {
        settings.set_setting(name, value.clone()).await?;
    }
    let storages = Arc::new(MemoryStorageRegistry::new(stash.storages.iter().cloned()));
    info!(
        "Loaded {} system settings and {} object storages",
        stash.settings.len(),
        stash.storages.len()
    );

    let resources = Arc::new(MemoryResourceStore::new());
    let notes = Arc::new(MemoryNoteStore::new());
    let local = Arc::new(LocalAttachmentStorage::new(stash.data_dir.clone()));
    let thumbnails = Arc::new(DefaultThumbnailService::new(
        stash.data_dir.join(THUMBNAIL_CACHE_DIR),
        stash.thumbnail.width,
        ConcurrencyGate::new(stash.thumbnail.max_concurrency),
    ));

    let persister = BlobPersister::new(
        settings.clone(),
        storages,
        Arc::new(S3ObjectStorageConnector),
        local.clone(),
    );
    let resource_service = ResourceService::new(resources.clone(), settings, persister, local.clone(), thumbnails.clone())
        .with_upload_buffer_bytes(stash.upload.buffer_size_mib.saturating_mul(1024 * 1024));
    let delivery_service = ResourceDeliveryService::new(resources, notes, local, thumbnails);

    Ok(AppState {
        jwt_service: Arc::new(JwtService::new(
            &stash.security.jwt_secret,
            stash.security.jwt_issuer.clone(),
        )),
        resource_service: Arc::new(resource_service),
        delivery_service: Arc::new(delivery_service),
    })
}
