mod catalog;
mod detail;
mod favorites;
mod home;
pub mod logging;

use std::sync::Arc;

use tokio::sync::RwLock;

use enterverse_api::books::BooksClient;
use enterverse_api::profile::{Profile, ProfileClient};
use enterverse_api::rawg::RawgClient;
use enterverse_api::tmdb::TmdbClient;
use enterverse_api::{CatalogProvider, MediaType};
use enterverse_core::config::AppConfig;
use enterverse_core::favorites::FavoritesStore;
use enterverse_core::storage::UnavailableStore;

pub use catalog::{CatalogScreen, PageOutcome, ScreenSnapshot};
pub use detail::{open_trailer, DetailOrchestrator, DetailOutcome, DetailRequest, TrailerAction};
pub use favorites::FavoritesHandle;
pub use home::{load_home_feed, FeedSection, HomeFeed};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Application services wired from one configuration.
pub struct Runtime {
    config: Arc<RwLock<AppConfig>>,
    movies: Arc<TmdbClient>,
    books: Arc<BooksClient>,
    games: Arc<RawgClient>,
    profile: ProfileClient,
    details: DetailOrchestrator<TmdbClient, BooksClient, RawgClient>,
    favorites: FavoritesHandle,
}

impl Runtime {
    /// Load the user config, open the database and start the favorites actor.
    pub fn new() -> Result<Self, RuntimeError> {
        let config = AppConfig::load().map_err(|e| RuntimeError::Config(e.to_string()))?;
        Self::open(config)
    }

    /// Open the database and start the favorites actor for an already loaded config.
    ///
    /// Storage problems only cost favorites persistence; catalog, detail and
    /// profile requests keep working.
    pub fn open(config: AppConfig) -> Result<Self, RuntimeError> {
        let key = config.storage.favorites_key.clone();
        let favorites = match AppConfig::ensure_db_path() {
            Ok(db_path) => FavoritesHandle::open(&db_path, &key)?,
            Err(e) => {
                tracing::error!("Failed to prepare data directory: {e}");
                FavoritesHandle::spawn(FavoritesStore::initialize(
                    UnavailableStore::new(e.to_string()),
                    key,
                ))?
            }
        };
        Ok(Self::with_config(config, favorites))
    }

    pub fn with_config(config: AppConfig, favorites: FavoritesHandle) -> Self {
        let movies = Arc::new(
            TmdbClient::new(config.tmdb.api_key.clone())
                .with_base_url(config.tmdb.base_url.clone())
                .with_language(config.tmdb.language.clone()),
        );
        let books = Arc::new(
            BooksClient::new()
                .with_base_url(config.books.base_url.clone())
                .with_default_query(config.general.default_book_query.clone()),
        );
        let games = Arc::new(
            RawgClient::new(config.rawg.api_key.clone()).with_base_url(config.rawg.base_url.clone()),
        );
        let profile = ProfileClient::new(config.profile.user_id)
            .with_base_url(config.profile.base_url.clone())
            .with_api_key(config.profile.api_key.clone());

        if config.tmdb.api_key.is_empty() {
            tracing::warn!("No TMDB api_key configured; film requests will be rejected");
        }
        if config.rawg.api_key.is_empty() {
            tracing::warn!("No RAWG api_key configured; game requests will be rejected");
        }

        Self {
            details: DetailOrchestrator::new(movies.clone(), books.clone(), games.clone()),
            config: Arc::new(RwLock::new(config)),
            movies,
            books,
            games,
            profile,
            favorites,
        }
    }

    pub async fn get_config(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Persist `new_config`. Provider clients pick it up on the next start.
    pub async fn update_config(&self, new_config: AppConfig) -> Result<(), RuntimeError> {
        new_config
            .save()
            .map_err(|e| RuntimeError::Config(e.to_string()))?;
        *self.config.write().await = new_config;
        Ok(())
    }

    pub fn movie_screen(&self) -> CatalogScreen<TmdbClient> {
        CatalogScreen::new(self.movies.clone())
    }

    pub fn book_screen(&self) -> CatalogScreen<BooksClient> {
        CatalogScreen::new(self.books.clone())
    }

    pub fn game_screen(&self) -> CatalogScreen<RawgClient> {
        CatalogScreen::new(self.games.clone())
    }

    /// Search `media_type` and pull up to `pages` pages into one snapshot.
    pub async fn browse(
        &self,
        media_type: MediaType,
        query: &str,
        pages: u32,
    ) -> Result<ScreenSnapshot, RuntimeError> {
        match media_type {
            MediaType::Movie => browse(&self.movie_screen(), query, pages).await,
            MediaType::Book => browse(&self.book_screen(), query, pages).await,
            MediaType::Game => browse(&self.game_screen(), query, pages).await,
        }
    }

    pub async fn detail(&self, request: &DetailRequest) -> DetailOutcome {
        self.details.load(request).await
    }

    pub fn favorites(&self) -> FavoritesHandle {
        self.favorites.clone()
    }

    pub async fn home_feed(&self) -> HomeFeed {
        let book_query = self.config.read().await.general.home_book_query.clone();
        load_home_feed(
            self.movies.as_ref(),
            self.books.as_ref(),
            &book_query,
            self.games.as_ref(),
            self.movies.genres(),
        )
        .await
    }

    pub async fn profile(&self) -> Result<Profile, RuntimeError> {
        self.profile
            .fetch_profile()
            .await
            .map_err(|e| RuntimeError::Api(e.to_string()))
    }
}

async fn browse<P: CatalogProvider>(
    screen: &CatalogScreen<P>,
    query: &str,
    pages: u32,
) -> Result<ScreenSnapshot, RuntimeError> {
    if let PageOutcome::Failed(e) = screen.search(query).await {
        return Err(RuntimeError::Api(e.to_string()));
    }
    for _ in 1..pages {
        match screen.load_more().await {
            PageOutcome::Applied { .. } => {}
            PageOutcome::Failed(e) => {
                tracing::warn!(error = %e, "Stopped paging early");
                break;
            }
            PageOutcome::Stale | PageOutcome::Ignored => break,
        }
    }
    Ok(screen.snapshot().await)
}

#[cfg(test)]
mod tests {
    use enterverse_core::storage::Storage;
    use serde_json::json;

    use super::*;

    fn runtime() -> Runtime {
        let store = FavoritesStore::initialize(Storage::open_memory().unwrap(), "favorites");
        Runtime::with_config(AppConfig::default(), FavoritesHandle::spawn(store).unwrap())
    }

    #[tokio::test]
    async fn test_favorites_through_runtime() {
        let runtime = runtime();
        let favorites = runtime.favorites();

        let outcome = favorites
            .add(enterverse_core::favorites::FavoriteInput::Raw {
                media_type: Some(MediaType::Book),
                payload: json!({"id": "zyTCAlFPjgYC", "volumeInfo": {"title": "The Google Story"}}),
            })
            .await
            .unwrap();
        assert_eq!(outcome.favorites[0].title, "The Google Story");
        assert!(runtime.favorites().is_member("zyTCAlFPjgYC", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_screens_start_idle() {
        let runtime = runtime();
        let snapshot = runtime.book_screen().snapshot().await;
        assert_eq!(snapshot.media_type, MediaType::Book);
        assert!(snapshot.items.is_empty());
        assert_eq!(runtime.get_config().await.storage.favorites_key, "favorites");
    }
}
