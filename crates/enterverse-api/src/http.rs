use url::Url;

/// Append path segments to a base URL, percent-encoding each one.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_segments() {
        let url = endpoint("https://api.themoviedb.org/3", &["movie", "550", "videos"]).unwrap();
        assert_eq!(url.as_str(), "https://api.themoviedb.org/3/movie/550/videos");
    }

    #[test]
    fn test_endpoint_trailing_slash_and_escaping() {
        let url = endpoint("https://example.com/api/", &["games", "a b"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/games/a%20b");
    }
}
