use serde::Deserialize;

use crate::detail::{non_empty, DetailExtra, DetailModel, Rating, NO_DESCRIPTION};
use crate::traits::{CatalogItem, MediaType, NO_TITLE};

/// `GET /games` listing. `next` is null on the last page.
#[derive(Debug, Deserialize)]
pub struct RawgListResponse {
    #[serde(default)]
    pub count: u64,
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl RawgListResponse {
    pub fn has_next(&self) -> bool {
        !self.results.is_empty() && self.next.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawgGenre {
    pub name: String,
}

/// A game as it appears in a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawgGame {
    pub id: u64,
    pub name: Option<String>,
    pub background_image: Option<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub genres: Vec<RawgGenre>,
}

/// Full `/games/{id}` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawgGameDetails {
    pub id: u64,
    pub name: Option<String>,
    pub description_raw: Option<String>,
    pub background_image: Option<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub genres: Vec<RawgGenre>,
}

impl RawgGame {
    pub fn into_catalog_item(self, raw: serde_json::Value) -> CatalogItem {
        CatalogItem {
            id: self.id.to_string(),
            title: non_empty(self.name).unwrap_or_else(|| NO_TITLE.to_string()),
            thumbnail_url: non_empty(self.background_image),
            media_type: MediaType::Game,
            provider_raw: raw,
        }
    }
}

impl RawgGameDetails {
    pub fn into_detail(self) -> DetailModel {
        DetailModel {
            id: self.id.to_string(),
            title: non_empty(self.name).unwrap_or_else(|| NO_TITLE.to_string()),
            description: non_empty(self.description_raw)
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            image_url: non_empty(self.background_image),
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            rating: self
                .rating
                .map(Rating::Score)
                .unwrap_or(Rating::NotAvailable),
            extra: DetailExtra::Game,
        }
    }
}
