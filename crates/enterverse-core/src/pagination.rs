//! Per-screen search and pagination state.
//!
//! [`ListController`] is a synchronous state machine. Callers take a
//! [`PageTicket`] before issuing a fetch and hand it back with the result; the
//! ticket's generation decides whether the result still belongs to the
//! screen's current query.

use std::collections::HashSet;

use enterverse_api::{CatalogItem, CatalogPage, Cursor, MediaType};
use tracing::debug;

/// A page fetch that did not produce a page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(String),
}

impl FetchError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Idle,
    /// First page of a new query in flight; the list is empty.
    Loading,
    Ready,
    LoadingMore,
}

/// Permission to fetch one page, tagged with the generation it was issued in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    pub generation: u64,
    pub query: String,
    pub cursor: Cursor,
}

/// What became of a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The page was appended.
    Applied { appended: usize },
    /// The fetch failed; accumulated items were kept.
    Failed,
    /// The ticket belonged to a superseded query and was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct ListController {
    first_cursor: Cursor,
    state: ScreenState,
    generation: u64,
    query: String,
    next_cursor: Option<Cursor>,
    items: Vec<CatalogItem>,
    last_error: Option<FetchError>,
    exhausted: bool,
}

impl ListController {
    pub fn new(first_cursor: Cursor) -> Self {
        Self {
            first_cursor,
            state: ScreenState::Idle,
            generation: 0,
            query: String::new(),
            next_cursor: None,
            items: Vec::new(),
            last_error: None,
            exhausted: false,
        }
    }

    /// Start a new query. Clears the list and supersedes any fetch in flight.
    pub fn begin_search(&mut self, query: &str) -> PageTicket {
        self.generation += 1;
        self.query = query.trim().to_string();
        self.items.clear();
        self.next_cursor = None;
        self.last_error = None;
        self.exhausted = false;
        self.state = ScreenState::Loading;

        debug!(generation = self.generation, query = %self.query, "Search started");
        PageTicket {
            generation: self.generation,
            query: self.query.clone(),
            cursor: self.first_cursor,
        }
    }

    /// Request the next page. `None` while a fetch is in flight, before the
    /// first search has landed, or once the listing is exhausted.
    pub fn begin_load_more(&mut self) -> Option<PageTicket> {
        if self.state != ScreenState::Ready {
            debug!(state = ?self.state, "Load more ignored");
            return None;
        }
        if self.exhausted {
            debug!("Load more ignored, listing exhausted");
            return None;
        }
        let cursor = self.next_cursor?;

        self.state = ScreenState::LoadingMore;
        Some(PageTicket {
            generation: self.generation,
            query: self.query.clone(),
            cursor,
        })
    }

    /// Apply the result of the fetch `ticket` was issued for.
    pub fn complete(
        &mut self,
        ticket: &PageTicket,
        result: Result<CatalogPage, FetchError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                query = %ticket.query,
                "Discarding stale page"
            );
            return Completion::Stale;
        }

        match result {
            Ok(page) => {
                let appended = page.items.len();
                self.exhausted = appended == 0 || page.next_cursor.is_none();
                self.next_cursor = page.next_cursor;
                self.items.extend(page.items);
                self.last_error = None;
                self.state = ScreenState::Ready;
                Completion::Applied { appended }
            }
            Err(e) => {
                // A failed first page still lets the user retry via load more.
                if self.state == ScreenState::Loading {
                    self.next_cursor = Some(ticket.cursor);
                }
                self.last_error = Some(e);
                self.state = ScreenState::Ready;
                Completion::Failed
            }
        }
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, ScreenState::Loading | ScreenState::LoadingMore)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn next_cursor(&self) -> Option<Cursor> {
        self.next_cursor
    }

    /// Everything appended so far, in provider order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// First occurrence of each `(id, type)`, in provider order.
    pub fn unique_items(&self) -> Vec<&CatalogItem> {
        let mut seen: HashSet<(&str, MediaType)> = HashSet::new();
        self.items.iter().filter(|i| seen.insert(i.key())).collect()
    }

    /// How many appended items repeat an earlier `(id, type)`.
    pub fn duplicate_count(&self) -> usize {
        self.items.len() - self.unique_items().len()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
