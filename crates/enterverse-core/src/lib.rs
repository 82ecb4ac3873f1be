pub mod config;
pub mod error;
pub mod favorites;
pub mod pagination;
pub mod storage;
