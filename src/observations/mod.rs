pub mod error;
pub mod ghcn;
pub mod parquet;
pub mod store;
