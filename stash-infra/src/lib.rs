pub mod attachment;
pub mod security;
pub mod store;
pub mod system_setting;

pub use attachment::{AttachmentStorage, LocalAttachmentStorage, S3ObjectStorageConnector};
pub use security::JwtService;
pub use store::{MemoryNoteStore, MemoryResourceStore, MemoryStorageRegistry};
pub use system_setting::MemorySystemSettingStore;
