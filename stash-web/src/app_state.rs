use stash_infra::security::JwtService;
use stash_service::{ResourceDeliveryService, ResourceService};
use std::sync::Arc;

/// 应用状态
/// 包含所有需要的服务实例
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: Arc<JwtService>,
    pub resource_service: Arc<ResourceService>,
    pub delivery_service: Arc<ResourceDeliveryService>,
}
