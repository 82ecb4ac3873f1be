pub mod books;
pub mod detail;
mod http;
pub mod profile;
pub mod rawg;
pub mod tmdb;
pub mod traits;

pub use detail::{DetailExtra, DetailModel, DetailPayload, Rating};
pub use traits::{CatalogItem, CatalogPage, CatalogProvider, Cursor, MediaType};
