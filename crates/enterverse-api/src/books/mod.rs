pub mod client;
pub mod error;
pub mod types;

pub use client::BooksClient;
pub use error::BooksError;
