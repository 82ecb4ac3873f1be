use reqwest::Client;
use serde::de::DeserializeOwned;

use super::error::RawgError;
use super::types::{RawgGame, RawgGameDetails, RawgListResponse};
use crate::detail::DetailPayload;
use crate::http::endpoint;
use crate::traits::{CatalogPage, CatalogProvider, Cursor, MediaType};

pub const BASE_URL: &str = "https://api.rawg.io/api";

/// RAWG's default `page_size`.
const PAGE_SIZE: u32 = 20;

/// RAWG video game database client. Credentials travel as the `key` query parameter.
pub struct RawgClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl RawgClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: BASE_URL.into(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, RawgError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "RAWG API error");
            Err(RawgError::Api {
                status,
                message: body,
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T, RawgError> {
        let url = endpoint(&self.base_url, segments)?;
        tracing::debug!(path = url.path(), "RAWG request");

        let resp = self
            .http
            .get(url)
            .query(&[("key", &self.api_key)])
            .query(params)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| RawgError::Parse(e.to_string()))
    }

    /// `GET /games?search=..&page=..`. An empty search lists everything.
    pub async fn search_games(&self, query: &str, page: u32) -> Result<RawgListResponse, RawgError> {
        self.get_json(&["games"], &search_params(query, page)).await
    }

    /// `GET /games/{id}`.
    pub async fn game(&self, id: &str) -> Result<RawgGameDetails, RawgError> {
        self.get_json(&["games", id], &[]).await
    }
}

fn search_params(query: &str, page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("search", query.trim().to_string()),
        ("page", page.to_string()),
    ]
}

/// Normalize a listing fetched for `page`, skipping results that do not parse.
fn into_catalog_page(resp: RawgListResponse, page: u32) -> CatalogPage {
    let next_cursor = resp.has_next().then_some(Cursor::Page(page + 1));
    let items = resp
        .results
        .into_iter()
        .filter_map(|raw| {
            let game: RawgGame = serde_json::from_value(raw.clone())
                .map_err(|e| tracing::debug!(error = %e, "Skipping malformed RAWG result"))
                .ok()?;
            Some(game.into_catalog_item(raw))
        })
        .collect();

    CatalogPage { items, next_cursor }
}

impl CatalogProvider for RawgClient {
    type Error = RawgError;

    fn media_type(&self) -> MediaType {
        MediaType::Game
    }

    fn first_cursor(&self) -> Cursor {
        Cursor::Page(1)
    }

    async fn search(&self, query: &str, cursor: Cursor) -> Result<CatalogPage, RawgError> {
        let page = cursor.as_page(PAGE_SIZE);
        let resp = self.search_games(query, page).await?;
        Ok(into_catalog_page(resp, page))
    }

    async fn fetch_detail(&self, id: &str) -> Result<DetailPayload, RawgError> {
        let game = self.game(id).await?;
        Ok(DetailPayload::Game(game))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params() {
        assert_eq!(
            search_params(" witcher ", 2),
            vec![("search", "witcher".to_string()), ("page", "2".to_string())]
        );
        assert_eq!(search_params("", 1)[0], ("search", String::new()));
    }

    #[test]
    fn test_listing_skips_malformed_results() {
        let resp: RawgListResponse = serde_json::from_str(
            r#"{
                "count": 890,
                "next": "https://api.rawg.io/api/games?page=2&search=witcher",
                "results": [
                    {"id": 3328, "name": "The Witcher 3: Wild Hunt"},
                    {"name": "No id"},
                    {"id": 10035, "name": "The Witcher"}
                ]
            }"#,
        )
        .unwrap();

        let page = into_catalog_page(resp, 1);
        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["3328", "10035"]);
        assert_eq!(page.next_cursor, Some(Cursor::Page(2)));
    }

    #[test]
    fn test_null_next_ends_listing() {
        let resp: RawgListResponse =
            serde_json::from_str(r#"{"count": 1, "next": null, "results": [{"id": 1, "name": "x"}]}"#)
                .unwrap();
        let page = into_catalog_page(resp, 45);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_cursor, None);
    }
}
