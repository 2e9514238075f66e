pub mod note;
pub mod resource;
pub mod setting;
pub mod storage;
pub mod store;

pub use note::{Note, Visibility};
pub use resource::{FindResource, Resource, ResourceCreate, ResourceLocation, ResourcePatch};
pub use storage::{ObjectStorage, ObjectStorageConnector, S3Config, StorageBackend, StorageConfigError, StorageType};
pub use store::{NoteStore, ResourceStore, StorageRegistry};
