use std::future::Future;

use enterverse_api::tmdb::GenreMap;
use enterverse_api::{CatalogItem, CatalogProvider};

/// First page of one provider, or why it is missing.
#[derive(Debug, Clone, Default)]
pub struct FeedSection {
    pub items: Vec<CatalogItem>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HomeFeed {
    pub movies: FeedSection,
    pub books: FeedSection,
    pub games: FeedSection,
    pub genres: GenreMap,
    pub genres_error: Option<String>,
}

impl HomeFeed {
    /// Genre names for a film card, empty when the lookup failed.
    pub fn movie_genres(&self, item: &CatalogItem) -> Vec<String> {
        self.genres.names_for_item(item)
    }
}

async fn first_page<P: CatalogProvider>(provider: &P, query: &str) -> FeedSection {
    match provider.search(query, provider.first_cursor()).await {
        Ok(page) => FeedSection {
            items: page.items,
            error: None,
        },
        Err(e) => {
            tracing::warn!(media_type = %provider.media_type(), error = %e, "Home feed section failed");
            FeedSection {
                items: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// Load every section concurrently. Each degrades on its own.
///
/// Films and games list their popular entries; books run `book_query`.
pub async fn load_home_feed<M, B, G, E>(
    movies: &M,
    books: &B,
    book_query: &str,
    games: &G,
    genres: impl Future<Output = Result<GenreMap, E>>,
) -> HomeFeed
where
    M: CatalogProvider,
    B: CatalogProvider,
    G: CatalogProvider,
    E: std::fmt::Display,
{
    let (movies, books, games, genres) = tokio::join!(
        first_page(movies, ""),
        first_page(books, book_query),
        first_page(games, ""),
        genres,
    );

    let (genres, genres_error) = match genres {
        Ok(map) => (map, None),
        Err(e) => {
            tracing::warn!(error = %e, "Genre lookup failed");
            (GenreMap::default(), Some(e.to_string()))
        }
    };

    tracing::debug!(
        movies = movies.items.len(),
        books = books.items.len(),
        games = games.items.len(),
        genres = genres.len(),
        "Home feed loaded"
    );

    HomeFeed {
        movies,
        books,
        games,
        genres,
        genres_error,
    }
}
