use serde::Deserialize;

use crate::detail::{join_or, non_empty, DetailExtra, DetailModel, Rating, NO_DESCRIPTION, UNKNOWN};
use crate::traits::{CatalogItem, MediaType, NO_TITLE};

/// Shown when a volume has no cover image.
pub const PLACEHOLDER_COVER_URL: &str =
    "https://github.com/user-attachments/assets/e5961e4b-c3bd-4f2b-9353-a8b1b60343e5";

// ── Response envelopes ───────────────────────────────────────────

/// `GET /volumes` search response. `items` is absent past the last page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSearchResponse {
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

// ── Volume types ─────────────────────────────────────────────────

/// A Google Books volume, as returned by both search and `/volumes/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookVolume {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_links: Option<ImageLinks>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
}

impl VolumeInfo {
    fn thumbnail(&self) -> Option<String> {
        self.image_links
            .as_ref()
            .and_then(|links| non_empty(links.thumbnail.clone()))
    }
}

// ── Conversions ──────────────────────────────────────────────────

impl BookVolume {
    pub fn into_catalog_item(self, raw: serde_json::Value) -> CatalogItem {
        let thumbnail_url = self.volume_info.thumbnail();
        CatalogItem {
            id: self.id,
            title: non_empty(self.volume_info.title).unwrap_or_else(|| NO_TITLE.to_string()),
            thumbnail_url,
            media_type: MediaType::Book,
            provider_raw: raw,
        }
    }

    pub fn into_detail(self) -> DetailModel {
        let info = self.volume_info;
        let image_url = info
            .thumbnail()
            .unwrap_or_else(|| PLACEHOLDER_COVER_URL.to_string());

        DetailModel {
            id: self.id,
            title: non_empty(info.title).unwrap_or_else(|| NO_TITLE.to_string()),
            description: non_empty(info.description).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            image_url: Some(image_url),
            genres: info.categories,
            rating: Rating::out_of_five(info.average_rating),
            extra: DetailExtra::Book {
                authors: join_or(&info.authors, UNKNOWN),
                publisher: non_empty(info.publisher).unwrap_or_else(|| UNKNOWN.to_string()),
                published_date: non_empty(info.published_date)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_volume_normalizes() {
        let json = r#"{"volumeInfo": {"title": "Dune", "authors": ["F. Herbert"], "averageRating": 4}}"#;
        let volume: BookVolume = serde_json::from_str(json).unwrap();
        let model = volume.into_detail();

        assert_eq!(model.title, "Dune");
        assert_eq!(model.rating.to_string(), "4 / 5");
        assert_eq!(model.description, "No description available.");
        assert_eq!(model.image_url.as_deref(), Some(PLACEHOLDER_COVER_URL));
        assert_eq!(model.genres_display(), "N/A");
        match model.extra {
            DetailExtra::Book {
                authors,
                publisher,
                published_date,
            } => {
                assert_eq!(authors, "F. Herbert");
                assert_eq!(publisher, "Unknown");
                assert_eq!(published_date, "Unknown");
            }
            other => panic!("unexpected extra: {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_search_response() {
        let json = r#"{
            "kind": "books#volumes",
            "totalItems": 1342,
            "items": [
                {
                    "kind": "books#volume",
                    "id": "B1hSG45JCX4C",
                    "volumeInfo": {
                        "title": "Dune",
                        "authors": ["Frank Herbert", "Brian Herbert"],
                        "publisher": "Penguin",
                        "publishedDate": "2003-08-26",
                        "categories": ["Fiction"],
                        "averageRating": 4.5,
                        "imageLinks": {
                            "smallThumbnail": "http://books.google.com/books/content?id=B1hSG45JCX4C&zoom=5",
                            "thumbnail": "http://books.google.com/books/content?id=B1hSG45JCX4C&zoom=1"
                        }
                    }
                }
            ]
        }"#;

        let resp: VolumeSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.total_items, 1342);
        let raw = resp.items[0].clone();
        let volume: BookVolume = serde_json::from_value(raw.clone()).unwrap();
        let item = volume.clone().into_catalog_item(raw);
        assert_eq!(item.id, "B1hSG45JCX4C");
        assert_eq!(item.title, "Dune");
        assert!(item.thumbnail_url.as_deref().unwrap().contains("zoom=1"));

        let model = volume.into_detail();
        assert_eq!(model.rating.to_string(), "4.5 / 5");
        assert_eq!(model.genres, vec!["Fiction"]);
        match model.extra {
            DetailExtra::Book { authors, .. } => assert_eq!(authors, "Frank Herbert, Brian Herbert"),
            other => panic!("unexpected extra: {other:?}"),
        }
    }

    #[test]
    fn test_past_last_page_has_no_items() {
        let resp: VolumeSearchResponse =
            serde_json::from_str(r#"{"kind": "books#volumes", "totalItems": 12}"#).unwrap();
        assert!(resp.items.is_empty());
    }
}
