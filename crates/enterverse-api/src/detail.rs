use serde::{Deserialize, Serialize};

use crate::books::types::BookVolume;
use crate::rawg::types::RawgGameDetails;
use crate::tmdb::types::TmdbMovieDetails;
use crate::traits::MediaType;

/// Description used when a provider supplies none.
pub const NO_DESCRIPTION: &str = "No description available.";

/// Placeholder for any missing display value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder for missing book metadata (authors, publisher, date).
pub const UNKNOWN: &str = "Unknown";

/// Full provider payload for one entry, tagged by provider.
#[derive(Debug, Clone)]
pub enum DetailPayload {
    Movie {
        details: TmdbMovieDetails,
        trailer_video_id: Option<String>,
    },
    Book(BookVolume),
    Game(RawgGameDetails),
}

impl DetailPayload {
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Movie { .. } => MediaType::Movie,
            Self::Book(_) => MediaType::Book,
            Self::Game(_) => MediaType::Game,
        }
    }

    /// Normalize into the provider-independent detail shape.
    pub fn normalize(self) -> DetailModel {
        match self {
            Self::Movie {
                details,
                trailer_video_id,
            } => details.into_detail(trailer_video_id),
            Self::Book(volume) => volume.into_detail(),
            Self::Game(game) => game.into_detail(),
        }
    }
}

/// A provider rating after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    /// Numeric pass-through (TMDB vote average, RAWG rating).
    Score(f64),
    /// Pre-formatted text, e.g. Google Books' `"4 / 5"`.
    Text(String),
    NotAvailable,
}

impl Rating {
    pub fn out_of_five(rating: Option<f64>) -> Self {
        match rating {
            Some(r) if r > 0.0 => Self::Text(format!("{} / 5", format_number(r))),
            _ => Self::NotAvailable,
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Score(score) => f.write_str(&format_number(*score)),
            Self::Text(text) => f.write_str(text),
            Self::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// Format a number without a trailing `.0` for whole values.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Fields that only exist for one media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DetailExtra {
    Movie {
        /// Four-digit year, or `"N/A"`.
        release_year: String,
        runtime_minutes: Option<u32>,
        trailer_video_id: Option<String>,
    },
    Book {
        /// Authors joined with `", "`, or `"Unknown"`.
        authors: String,
        publisher: String,
        published_date: String,
    },
    Game,
}

/// The normalized detail view of any catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailModel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub genres: Vec<String>,
    pub rating: Rating,
    pub extra: DetailExtra,
}

impl DetailModel {
    pub fn media_type(&self) -> MediaType {
        match self.extra {
            DetailExtra::Movie { .. } => MediaType::Movie,
            DetailExtra::Book { .. } => MediaType::Book,
            DetailExtra::Game => MediaType::Game,
        }
    }

    /// Genres joined for display, or `"N/A"` when there are none.
    pub fn genres_display(&self) -> String {
        if self.genres.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.genres.join(", ")
        }
    }

    /// Runtime as `"2h 35min"`, or `"N/A"`. Only movies have a runtime.
    pub fn runtime_display(&self) -> String {
        match self.extra {
            DetailExtra::Movie {
                runtime_minutes: Some(minutes),
                ..
            } if minutes > 0 => format!("{}h {}min", minutes / 60, minutes % 60),
            _ => NOT_AVAILABLE.to_string(),
        }
    }

    pub fn trailer_video_id(&self) -> Option<&str> {
        match &self.extra {
            DetailExtra::Movie {
                trailer_video_id, ..
            } => trailer_video_id.as_deref(),
            _ => None,
        }
    }
}

/// Join a list for display, falling back when it is empty.
pub(crate) fn join_or(values: &[String], fallback: &str) -> String {
    if values.is_empty() {
        fallback.to_string()
    } else {
        values.join(", ")
    }
}

/// Treat empty and whitespace-only strings as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
