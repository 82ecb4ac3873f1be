use reqwest::Client;
use serde::de::DeserializeOwned;

use super::error::TmdbError;
use super::types::{
    select_trailer, GenreMap, TmdbGenreList, TmdbMovie, TmdbMovieDetails, TmdbPagedResponse,
    TmdbVideoList,
};
use crate::detail::DetailPayload;
use crate::http::endpoint;
use crate::traits::{CatalogPage, CatalogProvider, Cursor, MediaType};

pub const BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB listings use 20 results per page.
const PAGE_SIZE: u32 = 20;

/// The Movie Database (v3) client. Credentials travel as the `api_key` query parameter.
pub struct TmdbClient {
    api_key: String,
    language: String,
    base_url: String,
    http: Client,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            language: "en-US".into(),
            base_url: BASE_URL.into(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TmdbError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "TMDB API error");
            Err(TmdbError::Api {
                status,
                message: body,
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T, TmdbError> {
        let url = endpoint(&self.base_url, segments)?;
        tracing::debug!(path = url.path(), "TMDB request");

        let resp = self
            .http
            .get(url)
            .query(&[("api_key", &self.api_key), ("language", &self.language)])
            .query(params)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))
    }

    /// `GET /movie/popular` for an empty query, `GET /search/movie` otherwise.
    pub async fn list_movies(&self, query: &str, page: u32) -> Result<TmdbPagedResponse, TmdbError> {
        let (segments, params) = listing_request(query, page);
        self.get_json(segments, &params).await
    }

    /// `GET /movie/{id}`.
    pub async fn movie_details(&self, id: &str) -> Result<TmdbMovieDetails, TmdbError> {
        self.get_json(&["movie", id], &[]).await
    }

    /// `GET /movie/{id}/videos`.
    pub async fn movie_videos(&self, id: &str) -> Result<TmdbVideoList, TmdbError> {
        self.get_json(&["movie", id, "videos"], &[]).await
    }

    /// `GET /genre/movie/list`.
    pub async fn genres(&self) -> Result<GenreMap, TmdbError> {
        let list: TmdbGenreList = self.get_json(&["genre", "movie", "list"], &[]).await?;
        Ok(GenreMap::from(list))
    }
}

/// Path and parameters of one listing page.
fn listing_request(query: &str, page: u32) -> (&'static [&'static str], Vec<(&'static str, String)>) {
    match query.trim() {
        "" => (&["movie", "popular"], vec![("page", page.to_string())]),
        q => (
            &["search", "movie"],
            vec![("query", q.to_string()), ("page", page.to_string())],
        ),
    }
}

/// Normalize a listing response fetched for `page`, skipping results that do not parse.
fn into_catalog_page(resp: TmdbPagedResponse, page: u32) -> CatalogPage {
    let next_cursor = resp.has_next().then_some(Cursor::Page(page + 1));
    let items = resp
        .results
        .into_iter()
        .filter_map(|raw| {
            let movie: TmdbMovie = serde_json::from_value(raw.clone())
                .map_err(|e| tracing::debug!(error = %e, "Skipping malformed TMDB result"))
                .ok()?;
            Some(movie.into_catalog_item(raw))
        })
        .collect();

    CatalogPage { items, next_cursor }
}

/// Combine the details and videos calls. Only the details call is required.
pub(crate) fn compose_movie_payload(
    id: &str,
    details: Result<TmdbMovieDetails, TmdbError>,
    videos: Result<TmdbVideoList, TmdbError>,
) -> Result<DetailPayload, TmdbError> {
    let details = details?;
    let trailer_video_id = match videos {
        Ok(list) => select_trailer(&list.results),
        Err(e) => {
            tracing::warn!(movie_id = id, error = %e, "Trailer lookup failed, continuing without");
            None
        }
    };

    Ok(DetailPayload::Movie {
        details,
        trailer_video_id,
    })
}

impl CatalogProvider for TmdbClient {
    type Error = TmdbError;

    fn media_type(&self) -> MediaType {
        MediaType::Movie
    }

    fn first_cursor(&self) -> Cursor {
        Cursor::Page(1)
    }

    async fn search(&self, query: &str, cursor: Cursor) -> Result<CatalogPage, TmdbError> {
        let page = cursor.as_page(PAGE_SIZE);
        let resp = self.list_movies(query, page).await?;
        Ok(into_catalog_page(resp, page))
    }

    async fn fetch_detail(&self, id: &str) -> Result<DetailPayload, TmdbError> {
        let (details, videos) = tokio::join!(self.movie_details(id), self.movie_videos(id));
        compose_movie_payload(id, details, videos)
    }
}
