//! Storage Adapter - 临时文件存储实现

mod scratch_store;

pub use scratch_store::TempFileStore;
