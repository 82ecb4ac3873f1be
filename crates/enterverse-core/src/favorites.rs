//! Persisted favorites collection.
//!
//! The whole collection is stored as one JSON array of
//! `{id, title, image, type}` records under a fixed key, and rewritten after
//! every mutation. Records are unique by `(id, type)`.

use enterverse_api::tmdb::poster_url;
use enterverse_api::traits::NO_TITLE;
use enterverse_api::{CatalogItem, DetailModel, MediaType};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::EnterverseError;
use crate::storage::KeyValueStore;

/// Minimal persisted form of a favorited entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "image", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Records written before types were tracked were always movies.
    #[serde(rename = "type", default = "legacy_media_type")]
    pub media_type: MediaType,
}

fn legacy_media_type() -> MediaType {
    MediaType::Movie
}

/// TMDB and RAWG ids were stored as JSON numbers by older clients.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Anything a view may ask to favorite.
#[derive(Debug, Clone)]
pub enum FavoriteInput {
    Item(CatalogItem),
    Detail(DetailModel),
    /// A raw provider payload, e.g. a list entry kept from an earlier session.
    Raw {
        media_type: Option<MediaType>,
        payload: Value,
    },
}

impl From<CatalogItem> for FavoriteInput {
    fn from(item: CatalogItem) -> Self {
        Self::Item(item)
    }
}

impl From<DetailModel> for FavoriteInput {
    fn from(detail: DetailModel) -> Self {
        Self::Detail(detail)
    }
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn raw_id(payload: &Value) -> Option<String> {
    match payload.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Title from whichever of `title`, `name`, `volumeInfo.title` is present.
fn raw_title(payload: &Value) -> Option<&str> {
    str_at(payload, &["title"])
        .or_else(|| str_at(payload, &["name"]))
        .or_else(|| str_at(payload, &["volumeInfo", "title"]))
}

/// Image from a TMDB poster path, a Books thumbnail, or a RAWG background.
fn raw_image(payload: &Value) -> Option<String> {
    str_at(payload, &["poster_path"])
        .map(poster_url)
        .or_else(|| str_at(payload, &["volumeInfo", "imageLinks", "thumbnail"]).map(str::to_string))
        .or_else(|| str_at(payload, &["background_image"]).map(str::to_string))
}

impl FavoriteRecord {
    /// Normalize a raw provider payload. Returns `None` when it carries no id.
    pub fn from_raw(media_type: Option<MediaType>, payload: &Value) -> Option<Self> {
        let id = raw_id(payload)?;
        let media_type = media_type
            .or_else(|| str_at(payload, &["type"]).and_then(|t| t.parse().ok()))
            .unwrap_or(MediaType::Movie);

        Some(Self {
            id,
            title: raw_title(payload).unwrap_or(NO_TITLE).to_string(),
            image_url: raw_image(payload),
            media_type,
        })
    }

    pub fn from_item(item: &CatalogItem) -> Self {
        Self {
            id: item.id.clone(),
            title: raw_title(&item.provider_raw)
                .map(str::to_string)
                .unwrap_or_else(|| item.title.clone()),
            image_url: raw_image(&item.provider_raw).or_else(|| item.thumbnail_url.clone()),
            media_type: item.media_type,
        }
    }

    pub fn from_detail(detail: &DetailModel) -> Self {
        Self {
            id: detail.id.clone(),
            title: detail.title.clone(),
            image_url: detail.image_url.clone(),
            media_type: detail.media_type(),
        }
    }

    pub fn from_input(input: &FavoriteInput) -> Option<Self> {
        match input {
            FavoriteInput::Item(item) => Some(Self::from_item(item)),
            FavoriteInput::Detail(detail) => Some(Self::from_detail(detail)),
            FavoriteInput::Raw {
                media_type,
                payload,
            } => Self::from_raw(*media_type, payload),
        }
    }

    fn matches(&self, id: &str, media_type: MediaType) -> bool {
        self.id == id && self.media_type == media_type
    }
}

/// Result of a mutating call.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    /// The collection after the call.
    pub favorites: Vec<FavoriteRecord>,
    /// Whether the collection changed.
    pub changed: bool,
    /// Whether storage now matches `favorites`.
    pub durable: bool,
    /// The persistence failure, if the write failed.
    pub error: Option<String>,
}

/// The favorites collection plus the backend it is persisted to.
pub struct FavoritesStore<S: KeyValueStore> {
    backend: S,
    key: String,
    records: Vec<FavoriteRecord>,
    durable: bool,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Load the persisted collection. Read or parse failures leave it empty.
    pub fn initialize(backend: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let records = match load_records(&backend, &key) {
            Ok(records) => {
                info!(count = records.len(), "Loaded favorites");
                records
            }
            Err(e) => {
                warn!(error = %e, "Failed to load favorites, starting empty");
                Vec::new()
            }
        };

        Self {
            backend,
            key,
            records,
            durable: true,
        }
    }

    pub fn records(&self) -> &[FavoriteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any record of any type has this id.
    pub fn is_member(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    pub fn is_member_of(&self, id: &str, media_type: MediaType) -> bool {
        self.records.iter().any(|r| r.matches(id, media_type))
    }

    /// False after a failed write until the next successful one.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// Add a record unless `(id, type)` is already present.
    pub fn add(&mut self, record: FavoriteRecord) -> MutationOutcome {
        let changed = !self.is_member_of(&record.id, record.media_type);
        if changed {
            debug!(id = %record.id, media_type = %record.media_type, "Adding favorite");
            self.records.push(record);
        }
        self.finish(changed)
    }

    /// Remove every record with this id, whatever its type.
    pub fn remove(&mut self, id: &str) -> MutationOutcome {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let changed = self.records.len() != before;
        if changed {
            debug!(id, "Removed favorite");
        }
        self.finish(changed)
    }

    pub fn remove_of(&mut self, id: &str, media_type: MediaType) -> MutationOutcome {
        let before = self.records.len();
        self.records.retain(|r| !r.matches(id, media_type));
        let changed = self.records.len() != before;
        self.finish(changed)
    }

    /// Write the collection now, regardless of whether it changed.
    pub fn flush(&mut self) -> Result<(), EnterverseError> {
        let result = self.persist();
        self.durable = result.is_ok();
        result
    }

    /// Hand the backend back, e.g. to reload from it.
    pub fn into_backend(self) -> S {
        self.backend
    }

    fn persist(&mut self) -> Result<(), EnterverseError> {
        let encoded = serde_json::to_string(&self.records)?;
        self.backend.put(&self.key, &encoded)
    }

    fn finish(&mut self, changed: bool) -> MutationOutcome {
        // An unchanged collection is only rewritten to recover from an earlier failure.
        let error = if changed || !self.durable {
            match self.flush() {
                Ok(()) => None,
                Err(e) => {
                    error!(error = %e, "Failed to save favorites");
                    Some(e.to_string())
                }
            }
        } else {
            None
        };

        MutationOutcome {
            favorites: self.records.clone(),
            changed,
            durable: self.durable,
            error,
        }
    }
}

fn load_records<S: KeyValueStore>(
    backend: &S,
    key: &str,
) -> Result<Vec<FavoriteRecord>, EnterverseError> {
    let Some(raw) = backend.get(key)? else {
        return Ok(Vec::new());
    };
    let decoded: Vec<FavoriteRecord> = serde_json::from_str(&raw)?;

    let mut records: Vec<FavoriteRecord> = Vec::with_capacity(decoded.len());
    for record in decoded {
        if !records.iter().any(|r| r.matches(&record.id, record.media_type)) {
            records.push(record);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::storage::Storage;

    /// In-memory backend whose writes can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        value: Option<String>,
        fail_writes: Arc<AtomicBool>,
        fail_reads: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, EnterverseError> {
            if self.fail_reads {
                return Err(EnterverseError::Config("read failed".into()));
            }
            Ok(self.value.clone())
        }

        fn put(&mut self, _key: &str, value: &str) -> Result<(), EnterverseError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(EnterverseError::Io(std::io::Error::other("disk full")));
            }
            self.value = Some(value.to_string());
            Ok(())
        }
    }

    fn record(id: &str, media_type: MediaType) -> FavoriteRecord {
        FavoriteRecord {
            id: id.into(),
            title: format!("Title {id}"),
            image_url: None,
            media_type,
        }
    }

    fn memory_store() -> FavoritesStore<Storage> {
        FavoritesStore::initialize(Storage::open_memory().unwrap(), "favorites")
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut store = memory_store();
        let first = store.add(record("550", MediaType::Movie));
        assert!(first.changed);
        let second = store.add(record("550", MediaType::Movie));
        assert!(!second.changed);
        assert_eq!(second.favorites.len(), 1);
        assert!(store.is_member("550"));
    }

    #[test]
    fn test_remove_then_add_restores_membership() {
        let mut store = memory_store();
        store.add(record("550", MediaType::Movie));
        let removed = store.remove("550");
        assert!(removed.changed);
        assert!(!store.is_member("550"));

        store.add(record("550", MediaType::Movie));
        assert!(store.is_member("550"));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = memory_store();
        store.add(record("1", MediaType::Game));
        let outcome = store.remove("404");
        assert!(!outcome.changed);
        assert!(outcome.durable);
        assert_eq!(outcome.favorites.len(), 1);
    }

    #[test]
    fn test_same_id_different_types_are_distinct() {
        let mut store = memory_store();
        store.add(record("42", MediaType::Movie));
        store.add(record("42", MediaType::Game));
        assert_eq!(store.len(), 2);
        assert!(store.is_member_of("42", MediaType::Game));

        store.remove_of("42", MediaType::Game);
        assert!(!store.is_member_of("42", MediaType::Game));
        assert!(store.is_member_of("42", MediaType::Movie));

        store.add(record("42", MediaType::Book));
        store.remove("42");
        assert!(store.is_empty());
    }

    #[test]
    fn test_reload_reproduces_records() {
        let mut store = memory_store();
        let mut expected = Vec::new();
        for (i, ty) in [MediaType::Movie, MediaType::Book, MediaType::Game]
            .into_iter()
            .cycle()
            .take(7)
            .enumerate()
        {
            let mut r = record(&format!("id-{i}"), ty);
            r.image_url = (i % 2 == 0).then(|| format!("https://img/{i}.jpg"));
            store.add(r.clone());
            expected.push(r);
        }

        let reloaded = FavoritesStore::initialize(store.into_backend(), "favorites");
        assert_eq!(reloaded.records(), expected.as_slice());
    }

    #[test]
    fn test_persisted_encoding() {
        let mut store = memory_store();
        store.add(FavoriteRecord {
            id: "B1hSG45JCX4C".into(),
            title: "Dune".into(),
            image_url: Some("http://books.google.com/x".into()),
            media_type: MediaType::Book,
        });
        let backend = store.into_backend();
        let raw = backend.get("favorites").unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            json!([{"id": "B1hSG45JCX4C", "title": "Dune", "image": "http://books.google.com/x", "type": "book"}])
        );
    }

    #[test]
    fn test_legacy_records_load() {
        let backend = FlakyStore {
            value: Some(
                r#"[{"id": 550, "title": "Fight Club", "image": "https://image.tmdb.org/t/p/w500/a.jpg"},
                    {"id": 550, "title": "Fight Club"},
                    {"id": "3328", "title": "The Witcher 3", "type": "game"}]"#
                    .into(),
            ),
            ..Default::default()
        };
        let store = FavoritesStore::initialize(backend, "favorites");
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].id, "550");
        assert_eq!(store.records()[0].media_type, MediaType::Movie);
        assert_eq!(store.records()[1].media_type, MediaType::Game);
    }

    #[test]
    fn test_corrupt_or_unreadable_storage_starts_empty() {
        let corrupt = FlakyStore {
            value: Some("not json".into()),
            ..Default::default()
        };
        assert!(FavoritesStore::initialize(corrupt, "favorites").is_empty());

        let unreadable = FlakyStore {
            fail_reads: true,
            ..Default::default()
        };
        assert!(FavoritesStore::initialize(unreadable, "favorites").is_empty());
    }

    #[test]
    fn test_failed_write_is_reported_and_recovered() {
        let fail = Arc::new(AtomicBool::new(true));
        let backend = FlakyStore {
            fail_writes: fail.clone(),
            ..Default::default()
        };
        let mut store = FavoritesStore::initialize(backend, "favorites");

        let outcome = store.add(record("1", MediaType::Movie));
        assert!(outcome.changed);
        assert!(!outcome.durable);
        assert!(outcome.error.is_some());
        // Still usable in-session.
        assert!(store.is_member("1"));
        assert!(!store.is_durable());

        fail.store(false, Ordering::SeqCst);
        let retry = store.add(record("1", MediaType::Movie));
        assert!(!retry.changed);
        assert!(retry.durable);

        let backend = store.into_backend();
        let saved: Vec<FavoriteRecord> =
            serde_json::from_str(backend.value.as_deref().unwrap()).unwrap();
        assert_eq!(saved.len(), 1);
    }

    #[test]
    fn test_from_raw_movie() {
        let payload = json!({"id": 693134, "title": "Dune: Part Two", "poster_path": "/p.jpg"});
        let r = FavoriteRecord::from_raw(Some(MediaType::Movie), &payload).unwrap();
        assert_eq!(r.id, "693134");
        assert_eq!(r.title, "Dune: Part Two");
        assert_eq!(r.image_url.as_deref(), Some("https://image.tmdb.org/t/p/w500/p.jpg"));
    }

    #[test]
    fn test_from_raw_book_and_game() {
        let book = json!({
            "id": "B1hSG45JCX4C",
            "volumeInfo": {"title": "Dune", "imageLinks": {"thumbnail": "http://books/thumb"}}
        });
        let r = FavoriteRecord::from_raw(Some(MediaType::Book), &book).unwrap();
        assert_eq!(r.title, "Dune");
        assert_eq!(r.image_url.as_deref(), Some("http://books/thumb"));

        let game = json!({"id": 3328, "name": "The Witcher 3", "background_image": "https://rawg/bg.jpg", "type": "game"});
        let r = FavoriteRecord::from_raw(None, &game).unwrap();
        assert_eq!(r.title, "The Witcher 3");
        assert_eq!(r.image_url.as_deref(), Some("https://rawg/bg.jpg"));
        assert_eq!(r.media_type, MediaType::Game);

        assert!(FavoriteRecord::from_raw(None, &json!({"title": "no id"})).is_none());
        let untitled = FavoriteRecord::from_raw(None, &json!({"id": "x"})).unwrap();
        assert_eq!(untitled.title, "No Title");
        assert_eq!(untitled.image_url, None);
    }

    #[test]
    fn test_from_item_prefers_raw_payload() {
        let item = CatalogItem {
            id: "3328".into(),
            title: "No Title".into(),
            thumbnail_url: None,
            media_type: MediaType::Game,
            provider_raw: json!({"id": 3328, "name": "The Witcher 3", "background_image": "https://rawg/bg.jpg"}),
        };
        let r = FavoriteRecord::from_input(&FavoriteInput::from(item)).unwrap();
        assert_eq!(r.title, "The Witcher 3");
        assert_eq!(r.image_url.as_deref(), Some("https://rawg/bg.jpg"));
        assert_eq!(r.media_type, MediaType::Game);
    }
}
