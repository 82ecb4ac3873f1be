use enterverse_api::{CatalogItem, DetailExtra, DetailModel};
use enterverse_core::favorites::FavoriteRecord;

const TITLE_WIDTH: usize = 48;

/// Shorten `s` to `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn item_line(item: &CatalogItem, genres: &[String]) -> String {
    let mut line = format!("{:<12} {}", item.id, truncate(&item.title, TITLE_WIDTH));
    if !genres.is_empty() {
        line.push_str(&format!("  [{}]", genres.join(", ")));
    }
    line
}

pub fn favorite_line(record: &FavoriteRecord) -> String {
    format!(
        "{:<6} {:<12} {}",
        record.media_type.as_str(),
        record.id,
        truncate(&record.title, TITLE_WIDTH)
    )
}

pub fn detail_block(model: &DetailModel, favorite: bool) -> String {
    let mut lines = vec![
        format!("{}{}", model.title, if favorite { "  ★" } else { "" }),
        format!("Rating:  {}", model.rating),
        format!("Genres:  {}", model.genres_display()),
    ];

    match &model.extra {
        DetailExtra::Movie {
            release_year,
            trailer_video_id,
            ..
        } => {
            lines.push(format!("Year:    {release_year}"));
            lines.push(format!("Runtime: {}", model.runtime_display()));
            lines.push(format!(
                "Trailer: {}",
                if trailer_video_id.is_some() { "available" } else { "not available" }
            ));
        }
        DetailExtra::Book {
            authors,
            publisher,
            published_date,
        } => {
            lines.push(format!("Authors: {authors}"));
            lines.push(format!("Publisher: {publisher} ({published_date})"));
        }
        DetailExtra::Game => {}
    }

    if let Some(ref url) = model.image_url {
        lines.push(format!("Image:   {url}"));
    }
    lines.push(String::new());
    lines.push(model.description.clone());
    lines.join("\n")
}
