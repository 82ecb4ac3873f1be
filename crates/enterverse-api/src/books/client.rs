use reqwest::Client;
use serde::de::DeserializeOwned;

use super::error::BooksError;
use super::types::{BookVolume, VolumeSearchResponse};
use crate::detail::DetailPayload;
use crate::http::endpoint;
use crate::traits::{CatalogPage, CatalogProvider, Cursor, MediaType};

pub const BASE_URL: &str = "https://www.googleapis.com/books/v1";

/// Records per request (`maxResults`).
pub const PAGE_SIZE: u32 = 10;

/// Query used when the caller searches for nothing.
pub const DEFAULT_QUERY: &str = "bestsellers";

/// Google Books volumes client. Public volume search needs no credentials.
pub struct BooksClient {
    base_url: String,
    default_query: String,
    http: Client,
}

impl Default for BooksClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BooksClient {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.into(),
            default_query: DEFAULT_QUERY.into(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_default_query(mut self, query: impl Into<String>) -> Self {
        self.default_query = query.into();
        self
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, BooksError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "Google Books API error");
            Err(BooksError::Api {
                status,
                message: body,
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T, BooksError> {
        let url = endpoint(&self.base_url, segments)?;
        tracing::debug!(path = url.path(), "Google Books request");

        let resp = self.http.get(url).query(params).send().await?;
        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| BooksError::Parse(e.to_string()))
    }

    /// `GET /volumes?q=..&startIndex=..&maxResults=10`.
    pub async fn search_volumes(
        &self,
        query: &str,
        start_index: u32,
    ) -> Result<VolumeSearchResponse, BooksError> {
        self.get_json(&["volumes"], &search_params(query, start_index))
            .await
    }

    /// `GET /volumes/{id}`.
    pub async fn volume(&self, id: &str) -> Result<BookVolume, BooksError> {
        self.get_json(&["volumes", id], &[]).await
    }
}

/// `query` trimmed, or `default_query` when nothing is left.
fn effective_query<'a>(query: &'a str, default_query: &'a str) -> &'a str {
    match query.trim() {
        "" => default_query,
        q => q,
    }
}

fn search_params(query: &str, start_index: u32) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.to_string()),
        ("startIndex", start_index.to_string()),
        ("maxResults", PAGE_SIZE.to_string()),
    ]
}

/// Normalize a search response fetched at `start_index`, skipping volumes that do not parse.
fn into_catalog_page(resp: VolumeSearchResponse, start_index: u32) -> CatalogPage {
    let next_cursor = next_offset(start_index, resp.items.len(), resp.total_items);
    let items = resp
        .items
        .into_iter()
        .filter_map(|raw| {
            let volume: BookVolume = serde_json::from_value(raw.clone())
                .map_err(|e| tracing::debug!(error = %e, "Skipping malformed volume"))
                .ok()?;
            Some(volume.into_catalog_item(raw))
        })
        .collect();

    CatalogPage { items, next_cursor }
}

/// Offset of the page after `start_index`, if the listing continues.
fn next_offset(start_index: u32, returned: usize, total_items: u32) -> Option<Cursor> {
    let next = start_index + PAGE_SIZE;
    (returned > 0 && next < total_items).then_some(Cursor::Offset(next))
}

impl CatalogProvider for BooksClient {
    type Error = BooksError;

    fn media_type(&self) -> MediaType {
        MediaType::Book
    }

    fn first_cursor(&self) -> Cursor {
        Cursor::Offset(0)
    }

    async fn search(&self, query: &str, cursor: Cursor) -> Result<CatalogPage, BooksError> {
        let start_index = cursor.as_offset(PAGE_SIZE);
        let query = effective_query(query, &self.default_query);
        let resp = self.search_volumes(query, start_index).await?;
        Ok(into_catalog_page(resp, start_index))
    }

    async fn fetch_detail(&self, id: &str) -> Result<DetailPayload, BooksError> {
        let volume = self.volume(id).await?;
        Ok(DetailPayload::Book(volume))
    }
}
