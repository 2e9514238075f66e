pub mod error;
pub mod resource;

pub use error::{PersistError, ResourceError, ThumbnailError};
pub use resource::{
    BlobPersister, ConcurrencyGate, CreateResourceRequest, DefaultThumbnailService, Delivery, ResourceContent,
    ResourceDeliveryService, ResourceService, ThumbnailService, TransferMode, UpdateResourceRequest, UploadBlob,
};
