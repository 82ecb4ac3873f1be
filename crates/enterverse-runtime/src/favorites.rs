use std::path::Path;

use tokio::sync::{mpsc, oneshot};

use enterverse_api::MediaType;
use enterverse_core::favorites::{FavoriteInput, FavoriteRecord, FavoritesStore, MutationOutcome};
use enterverse_core::storage::{KeyValueStore, Storage, UnavailableStore};

use crate::RuntimeError;

/// Cloneable handle to the favorites actor.
///
/// Every command is processed in order on one dedicated thread, so a
/// mutation's read-modify-write of the collection never interleaves with
/// another's.
#[derive(Clone)]
pub struct FavoritesHandle {
    tx: mpsc::UnboundedSender<FavoritesCommand>,
}

enum FavoritesCommand {
    All {
        reply: oneshot::Sender<Vec<FavoriteRecord>>,
    },
    IsMember {
        id: String,
        media_type: Option<MediaType>,
        reply: oneshot::Sender<bool>,
    },
    Add {
        input: Box<FavoriteInput>,
        reply: oneshot::Sender<Result<MutationOutcome, RuntimeError>>,
    },
    Remove {
        id: String,
        media_type: Option<MediaType>,
        reply: oneshot::Sender<MutationOutcome>,
    },
    Flush {
        reply: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

impl FavoritesHandle {
    /// Open the database at `path` and load the collection stored under `key`.
    ///
    /// A database that cannot be opened leaves favorites empty and every
    /// mutation unsaved; it never stops the rest of the application.
    pub fn open(path: &Path, key: &str) -> Result<Self, RuntimeError> {
        match Storage::open(path) {
            Ok(storage) => Self::spawn(FavoritesStore::initialize(storage, key)),
            Err(e) => {
                tracing::error!(path = %path.display(), "Failed to open database: {e}");
                Self::spawn(FavoritesStore::initialize(
                    UnavailableStore::new(e.to_string()),
                    key,
                ))
            }
        }
    }

    /// Move `store` onto its own thread and return a handle to it.
    pub fn spawn<S: KeyValueStore + 'static>(store: FavoritesStore<S>) -> Result<Self, RuntimeError> {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("favorites-actor".into())
            .spawn(move || actor_loop(store, rx))
            .map_err(|e| {
                tracing::error!("Failed to spawn favorites thread: {e}");
                RuntimeError::Database(e.to_string())
            })?;

        Ok(Self { tx })
    }

    pub async fn all(&self) -> Result<Vec<FavoriteRecord>, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(FavoritesCommand::All { reply });
        rx.await.map_err(|_| actor_closed())
    }

    /// Membership by id alone, or by `(id, type)` when a type is given.
    pub async fn is_member(
        &self,
        id: impl Into<String>,
        media_type: Option<MediaType>,
    ) -> Result<bool, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(FavoritesCommand::IsMember {
            id: id.into(),
            media_type,
            reply,
        });
        rx.await.map_err(|_| actor_closed())
    }

    pub async fn add(&self, input: impl Into<FavoriteInput>) -> Result<MutationOutcome, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(FavoritesCommand::Add {
            input: Box::new(input.into()),
            reply,
        });
        rx.await.unwrap_or_else(|_| Err(actor_closed()))
    }

    /// Remove by id, or only the record of `media_type` when one is given.
    pub async fn remove(
        &self,
        id: impl Into<String>,
        media_type: Option<MediaType>,
    ) -> Result<MutationOutcome, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(FavoritesCommand::Remove {
            id: id.into(),
            media_type,
            reply,
        });
        rx.await.map_err(|_| actor_closed())
    }

    pub async fn flush(&self) -> Result<(), RuntimeError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(FavoritesCommand::Flush { reply });
        rx.await.unwrap_or_else(|_| Err(actor_closed()))
    }
}

fn actor_closed() -> RuntimeError {
    RuntimeError::Database("favorites actor closed".into())
}

fn actor_loop<S: KeyValueStore>(
    mut store: FavoritesStore<S>,
    mut rx: mpsc::UnboundedReceiver<FavoritesCommand>,
) {
    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            FavoritesCommand::All { reply } => {
                let _ = reply.send(store.records().to_vec());
            }
            FavoritesCommand::IsMember {
                id,
                media_type,
                reply,
            } => {
                let member = match media_type {
                    Some(media_type) => store.is_member_of(&id, media_type),
                    None => store.is_member(&id),
                };
                let _ = reply.send(member);
            }
            FavoritesCommand::Add { input, reply } => {
                let result = FavoriteRecord::from_input(&input)
                    .map(|record| store.add(record))
                    .ok_or_else(|| RuntimeError::InvalidInput("favorite has no id".into()));
                let _ = reply.send(result);
            }
            FavoritesCommand::Remove {
                id,
                media_type,
                reply,
            } => {
                let outcome = match media_type {
                    Some(media_type) => store.remove_of(&id, media_type),
                    None => store.remove(&id),
                };
                let _ = reply.send(outcome);
            }
            FavoritesCommand::Flush { reply } => {
                let _ = reply.send(store.flush().map_err(|e| RuntimeError::Database(e.to_string())));
            }
        }
    }
    tracing::debug!("Favorites actor stopped");
}

#[cfg(test)]
mod tests {
    use enterverse_api::{CatalogItem, DetailModel};
    use serde_json::json;

    use super::*;

    fn handle() -> FavoritesHandle {
        let store = FavoritesStore::initialize(Storage::open_memory().unwrap(), "favorites");
        FavoritesHandle::spawn(store).unwrap()
    }

    fn game_item(id: &str) -> CatalogItem {
        CatalogItem {
            id: id.into(),
            title: format!("Game {id}"),
            thumbnail_url: Some(format!("https://media.rawg.io/{id}.jpg")),
            media_type: MediaType::Game,
            provider_raw: json!({"id": id, "name": format!("Game {id}")}),
        }
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_serialized() {
        let favorites = handle();

        let mut tasks = Vec::new();
        for i in 0..25 {
            let favorites = favorites.clone();
            tasks.push(tokio::spawn(async move {
                favorites.add(game_item(&i.to_string())).await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().unwrap().durable);
        }

        let all = favorites.all().await.unwrap();
        assert_eq!(all.len(), 25);
        for i in 0..25 {
            assert!(favorites.is_member(i.to_string(), None).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_add_from_detail_and_remove() {
        let favorites = handle();
        let detail: DetailModel = serde_json::from_value(json!({
            "id": "603",
            "title": "The Matrix",
            "description": "Set in the 22nd century...",
            "image_url": "https://image.tmdb.org/t/p/w500/m.jpg",
            "genres": ["Action"],
            "rating": 8.2,
            "extra": {"type": "movie", "release_year": "1999", "runtime_minutes": 136, "trailer_video_id": null}
        }))
        .unwrap();

        let added = favorites.add(detail).await.unwrap();
        assert!(added.changed);
        assert_eq!(added.favorites[0].title, "The Matrix");
        assert!(favorites.is_member("603", Some(MediaType::Movie)).await.unwrap());
        assert!(!favorites.is_member("603", Some(MediaType::Book)).await.unwrap());

        let removed = favorites.remove("603", None).await.unwrap();
        assert!(removed.changed);
        assert!(removed.favorites.is_empty());
        assert!(!favorites.remove("603", None).await.unwrap().changed);
    }

    #[tokio::test]
    async fn test_unopenable_database_degrades_to_session_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enterverse.db");
        std::fs::write(&path, b"this is not an sqlite database, just some bytes".repeat(100)).unwrap();

        let favorites = FavoritesHandle::open(&path, "favorites").unwrap();
        assert!(favorites.all().await.unwrap().is_empty());

        let outcome = favorites.add(game_item("3328")).await.unwrap();
        assert!(outcome.changed);
        assert!(!outcome.durable);
        assert!(outcome.error.is_some());
        assert!(favorites.is_member("3328", Some(MediaType::Game)).await.unwrap());
        assert!(favorites.flush().await.is_err());

        let removed = favorites.remove("3328", None).await.unwrap();
        assert!(removed.changed);
        assert!(!removed.durable);
    }

    #[tokio::test]
    async fn test_raw_input_without_id_is_rejected() {
        let favorites = handle();
        let err = favorites
            .add(FavoriteInput::Raw {
                media_type: None,
                payload: json!({"title": "orphan"}),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidInput(_)));
        favorites.flush().await.unwrap();
    }
}
