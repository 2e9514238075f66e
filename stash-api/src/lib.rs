pub mod security;
pub mod setting;
pub mod storage;

pub use security::{AuthenticatedUser, AuthenticationResult};
pub use setting::SystemSettingStore;
pub use storage::{ObjectStorageClient, UploadedObject};
