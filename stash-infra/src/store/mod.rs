pub mod note;
pub mod resource;
pub mod storage;

pub use note::MemoryNoteStore;
pub use resource::MemoryResourceStore;
pub use storage::MemoryStorageRegistry;
