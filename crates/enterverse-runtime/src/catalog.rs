use std::sync::Arc;

use tokio::sync::Mutex;

use enterverse_api::{CatalogItem, CatalogProvider, MediaType};
use enterverse_core::pagination::{Completion, FetchError, ListController, PageTicket, ScreenState};

/// What a `search` or `load_more` call did to the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Applied { appended: usize },
    /// The fetch failed and accumulated items were kept.
    Failed(FetchError),
    /// A newer search started while this fetch was in flight.
    Stale,
    /// Nothing was fetched: a fetch is in flight or the listing is exhausted.
    Ignored,
}

/// Point-in-time copy of a screen, safe to hand to a view.
#[derive(Debug, Clone)]
pub struct ScreenSnapshot {
    pub media_type: MediaType,
    pub query: String,
    pub state: ScreenState,
    /// Every appended item, in provider order.
    pub items: Vec<CatalogItem>,
    /// First occurrence of each `(id, type)`, for views that need stable keys.
    pub unique_items: Vec<CatalogItem>,
    pub duplicate_count: usize,
    pub exhausted: bool,
    pub last_error: Option<String>,
}

/// One list screen over one provider.
///
/// The controller lock is only held to issue or settle a ticket, never
/// across the provider call, so a `search` can supersede a fetch that is
/// still in flight.
pub struct CatalogScreen<P> {
    provider: Arc<P>,
    controller: Mutex<ListController>,
}

impl<P: CatalogProvider> CatalogScreen<P> {
    pub fn new(provider: Arc<P>) -> Self {
        let controller = ListController::new(provider.first_cursor());
        Self {
            provider,
            controller: Mutex::new(controller),
        }
    }

    /// Start a new query and fetch its first page.
    pub async fn search(&self, query: &str) -> PageOutcome {
        let ticket = self.controller.lock().await.begin_search(query);
        self.fetch(ticket).await
    }

    /// Fetch the next page of the current query.
    pub async fn load_more(&self) -> PageOutcome {
        let ticket = self.controller.lock().await.begin_load_more();
        match ticket {
            Some(ticket) => self.fetch(ticket).await,
            None => PageOutcome::Ignored,
        }
    }

    pub async fn snapshot(&self) -> ScreenSnapshot {
        let ctl = self.controller.lock().await;
        ScreenSnapshot {
            media_type: self.provider.media_type(),
            query: ctl.query().to_string(),
            state: ctl.state(),
            items: ctl.items().to_vec(),
            unique_items: ctl.unique_items().into_iter().cloned().collect(),
            duplicate_count: ctl.duplicate_count(),
            exhausted: ctl.is_exhausted(),
            last_error: ctl.last_error().map(ToString::to_string),
        }
    }

    async fn fetch(&self, ticket: PageTicket) -> PageOutcome {
        let media_type = self.provider.media_type();
        tracing::debug!(
            %media_type,
            query = %ticket.query,
            cursor = ?ticket.cursor,
            generation = ticket.generation,
            "Fetching page"
        );

        let result = self
            .provider
            .search(&ticket.query, ticket.cursor)
            .await
            .map_err(|e| {
                tracing::warn!(%media_type, error = %e, "Page fetch failed");
                FetchError::network(e)
            });
        let error = result.as_ref().err().cloned();

        match self.controller.lock().await.complete(&ticket, result) {
            Completion::Applied { appended } => PageOutcome::Applied { appended },
            Completion::Stale => PageOutcome::Stale,
            Completion::Failed => {
                PageOutcome::Failed(error.unwrap_or_else(|| FetchError::Network("unknown".into())))
            }
        }
    }
}
