use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::{handlers, security::auth_middleware, AppState};

/// 资源相关路由
/// 上传接口自行检查大小，因此关闭默认的请求体限制
pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/r/:id", get(handlers::stream_resource))
        .route("/r/:id/*filename", get(handlers::stream_named_resource))
        .route(
            "/api/v1/resource",
            get(handlers::list_resources).post(handlers::create_resource),
        )
        .route(
            "/api/v1/resource/blob",
            post(handlers::upload_blob).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/api/v1/resource/:id",
            patch(handlers::update_resource).delete(handlers::delete_resource),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
