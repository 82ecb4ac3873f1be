use std::sync::Arc;

use url::Url;

use enterverse_api::{CatalogItem, CatalogProvider, DetailModel, DetailPayload, MediaType};

const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch";

/// Which entry to load: the stub a list or favorites view already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub id: String,
    pub media_type: MediaType,
}

impl DetailRequest {
    pub fn new(id: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            id: id.into(),
            media_type,
        }
    }
}

impl From<&CatalogItem> for DetailRequest {
    fn from(item: &CatalogItem) -> Self {
        Self::new(item.id.clone(), item.media_type)
    }
}

/// Result of a detail load. Failures are terminal; nothing partial is shown.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Ready(DetailModel),
    Unavailable { reason: String },
}

/// What the view should do when the user asks for a trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailerAction {
    Open(Url),
    NotAvailable,
}

/// External player link for a trailer video id.
pub fn open_trailer(video_id: Option<&str>) -> TrailerAction {
    let Some(key) = video_id.map(str::trim).filter(|k| !k.is_empty()) else {
        return TrailerAction::NotAvailable;
    };
    match Url::parse_with_params(YOUTUBE_WATCH_URL, &[("v", key)]) {
        Ok(url) => TrailerAction::Open(url),
        Err(e) => {
            tracing::warn!(video_id = key, error = %e, "Invalid trailer link");
            TrailerAction::NotAvailable
        }
    }
}

/// Routes a detail request to the provider for its media type and
/// normalizes the payload.
pub struct DetailOrchestrator<M, B, G> {
    movies: Arc<M>,
    books: Arc<B>,
    games: Arc<G>,
}

impl<M, B, G> DetailOrchestrator<M, B, G>
where
    M: CatalogProvider,
    B: CatalogProvider,
    G: CatalogProvider,
{
    pub fn new(movies: Arc<M>, books: Arc<B>, games: Arc<G>) -> Self {
        Self {
            movies,
            books,
            games,
        }
    }

    pub async fn load(&self, request: &DetailRequest) -> DetailOutcome {
        let id = request.id.as_str();
        let payload = match request.media_type {
            MediaType::Movie => fetch(self.movies.as_ref(), id).await,
            MediaType::Book => fetch(self.books.as_ref(), id).await,
            MediaType::Game => fetch(self.games.as_ref(), id).await,
        };

        match payload {
            Ok(payload) if payload.media_type() == request.media_type => {
                DetailOutcome::Ready(payload.normalize())
            }
            Ok(payload) => {
                tracing::warn!(
                    id,
                    requested = %request.media_type,
                    received = %payload.media_type(),
                    "Provider returned a payload of the wrong type"
                );
                DetailOutcome::Unavailable {
                    reason: format!("expected {} details", request.media_type),
                }
            }
            Err(reason) => DetailOutcome::Unavailable { reason },
        }
    }
}

async fn fetch<P: CatalogProvider>(provider: &P, id: &str) -> Result<DetailPayload, String> {
    provider.fetch_detail(id).await.map_err(|e| {
        tracing::warn!(id, media_type = %provider.media_type(), error = %e, "Detail fetch failed");
        e.to_string()
    })
}
