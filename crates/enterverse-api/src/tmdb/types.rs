use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::detail::{non_empty, DetailExtra, DetailModel, Rating, NOT_AVAILABLE, NO_DESCRIPTION};
use crate::traits::{CatalogItem, MediaType, NO_TITLE};

/// CDN prefix for poster and backdrop paths.
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Build an absolute image URL from a TMDB relative path (`/abc.jpg`).
pub fn poster_url(path: &str) -> String {
    format!("{IMAGE_BASE_URL}{path}")
}

// ── Response envelopes ───────────────────────────────────────────

/// A paginated listing (`/movie/popular`, `/search/movie`).
///
/// `results` stays raw so each list item can carry its own JSON through.
#[derive(Debug, Deserialize)]
pub struct TmdbPagedResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

impl TmdbPagedResponse {
    pub fn has_next(&self) -> bool {
        !self.results.is_empty() && self.page < self.total_pages
    }
}

#[derive(Debug, Deserialize)]
pub struct TmdbGenreList {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbVideoList {
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub key: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub name: Option<String>,
}

/// Pick the first YouTube trailer from a video listing.
pub fn select_trailer(videos: &[TmdbVideo]) -> Option<String> {
    videos
        .iter()
        .find(|v| v.kind == "Trailer" && v.site == "YouTube")
        .map(|v| v.key.clone())
}

// ── Movie types ──────────────────────────────────────────────────

/// A movie as it appears in a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    pub vote_average: Option<f64>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
}

/// Full `/movie/{id}` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: u64,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub vote_average: Option<f64>,
    pub runtime: Option<u32>,
    pub release_date: Option<String>,
}

/// Genre id → name lookup built from `/genre/movie/list`.
#[derive(Debug, Clone, Default)]
pub struct GenreMap(HashMap<u32, String>);

impl GenreMap {
    /// Resolve genre ids to names, skipping ids the map does not know.
    pub fn names(&self, ids: &[u32]) -> Vec<String> {
        ids.iter().filter_map(|id| self.0.get(id).cloned()).collect()
    }

    /// Genre names for a film list item, read from its raw `genre_ids`.
    pub fn names_for_item(&self, item: &CatalogItem) -> Vec<String> {
        let ids: Vec<u32> = item
            .provider_raw
            .get("genre_ids")
            .and_then(|v| v.as_array())
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| id.as_u64().and_then(|id| u32::try_from(id).ok()))
                    .collect()
            })
            .unwrap_or_default();
        self.names(&ids)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<TmdbGenreList> for GenreMap {
    fn from(list: TmdbGenreList) -> Self {
        Self(list.genres.into_iter().map(|g| (g.id, g.name)).collect())
    }
}

/// Year component of a `YYYY-MM-DD` date.
fn release_year(date: Option<&str>) -> Option<String> {
    let date = date?.trim();
    if date.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => Some(d.year().to_string()),
        Err(_) => date.split('-').next().map(str::to_string),
    }
}

// ── Conversions ──────────────────────────────────────────────────

impl TmdbMovie {
    pub fn into_catalog_item(self, raw: serde_json::Value) -> CatalogItem {
        let title = non_empty(self.title)
            .or_else(|| non_empty(self.name))
            .unwrap_or_else(|| NO_TITLE.to_string());
        let thumbnail_url = non_empty(self.poster_path)
            .or_else(|| non_empty(self.backdrop_path))
            .map(|p| poster_url(&p));

        CatalogItem {
            id: self.id.to_string(),
            title,
            thumbnail_url,
            media_type: MediaType::Movie,
            provider_raw: raw,
        }
    }
}

impl TmdbMovieDetails {
    pub fn into_detail(self, trailer_video_id: Option<String>) -> DetailModel {
        let image_url = non_empty(self.poster_path)
            .or_else(|| non_empty(self.backdrop_path))
            .map(|p| poster_url(&p));
        let rating = self
            .vote_average
            .map(Rating::Score)
            .unwrap_or(Rating::NotAvailable);

        DetailModel {
            id: self.id.to_string(),
            title: non_empty(self.title).unwrap_or_else(|| NO_TITLE.to_string()),
            description: non_empty(self.overview).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            image_url,
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            rating,
            extra: DetailExtra::Movie {
                release_year: release_year(self.release_date.as_deref())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                runtime_minutes: self.runtime.filter(|r| *r > 0),
                trailer_video_id,
            },
        }
    }
}
