pub mod client;
pub mod error;
pub mod types;

pub use client::RawgClient;
pub use error::RawgError;
