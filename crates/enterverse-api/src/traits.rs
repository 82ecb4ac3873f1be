//! Trait definitions for media catalog providers.
//!
//! The film (TMDB), book (Google Books) and game (RAWG) clients all implement
//! [`CatalogProvider`], so list screens and the detail orchestrator never see
//! provider-specific JSON.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::detail::DetailPayload;

/// Title used when a provider payload carries no usable title.
pub const NO_TITLE: &str = "No Title";

/// The kind of media a catalog entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Book,
    Game,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Book => "book",
            Self::Game => "game",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "film" => Ok(Self::Movie),
            "book" => Ok(Self::Book),
            "game" => Ok(Self::Game),
            other => Err(format!("unknown media type: {other}")),
        }
    }
}

/// Position of a page within a provider listing.
///
/// TMDB and RAWG paginate by 1-based page index, Google Books by a zero-based
/// record offset. Each client converts whichever variant it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cursor {
    Page(u32),
    Offset(u32),
}

impl Cursor {
    /// The 1-based page index this cursor points at.
    pub fn as_page(self, page_size: u32) -> u32 {
        match self {
            Self::Page(page) => page.max(1),
            Self::Offset(offset) => offset / page_size.max(1) + 1,
        }
    }

    /// The zero-based record offset this cursor points at.
    pub fn as_offset(self, page_size: u32) -> u32 {
        match self {
            Self::Page(page) => page.saturating_sub(1) * page_size,
            Self::Offset(offset) => offset,
        }
    }
}

/// A list-level entry from any provider.
///
/// `(id, media_type)` identifies an entry within one screen's result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub media_type: MediaType,
    /// The provider's own JSON for this entry, passed through untouched.
    pub provider_raw: serde_json::Value,
}

impl CatalogItem {
    pub fn key(&self) -> (&str, MediaType) {
        (&self.id, self.media_type)
    }
}

/// One page of search results plus the cursor of the page after it.
///
/// `next_cursor` is `None` once the provider reports no further pages.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub next_cursor: Option<Cursor>,
}

/// A searchable media catalog.
pub trait CatalogProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// The media type every item from this provider carries.
    fn media_type(&self) -> MediaType;

    /// Cursor of the first page of any search.
    fn first_cursor(&self) -> Cursor;

    /// Fetch one page of results for `query`.
    fn search(
        &self,
        query: &str,
        cursor: Cursor,
    ) -> impl Future<Output = Result<CatalogPage, Self::Error>> + Send;

    /// Fetch the full provider payload for one entry.
    fn fetch_detail(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<DetailPayload, Self::Error>> + Send;
}
