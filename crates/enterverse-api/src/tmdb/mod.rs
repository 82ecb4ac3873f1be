pub mod client;
pub mod error;
pub mod types;

pub use client::TmdbClient;
pub use error::TmdbError;
pub use types::{poster_url, GenreMap, IMAGE_BASE_URL};
