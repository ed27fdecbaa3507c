use reqwest::Url;

/// Read the `replay` parameter from a query string (`?replay=abc&x=1`) or a
/// full URL.
pub fn extract_replay_id(input: &str) -> Option<String> {
    let query = match Url::parse(input) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) => input.trim_start_matches('?').to_string(),
    };

    // Parse through a dummy base so bare query strings get the same decoding.
    let url = Url::parse(&format!("http://localhost/?{}", query)).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "replay")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_string() {
        assert_eq!(extract_replay_id("?replay=outreach-demo").as_deref(), Some("outreach-demo"));
        assert_eq!(extract_replay_id("a=1&replay=x%20y").as_deref(), Some("x y"));
    }

    #[test]
    fn test_from_full_url() {
        assert_eq!(
            extract_replay_id("http://localhost:3000/chat?replay=demo").as_deref(),
            Some("demo")
        );
    }

    #[test]
    fn test_missing() {
        assert_eq!(extract_replay_id("?thread=1"), None);
        assert_eq!(extract_replay_id(""), None);
    }

    #[test]
    fn test_empty_value_is_kept() {
        assert_eq!(extract_replay_id("?replay=").as_deref(), Some(""));
    }
}
