use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static UUID_MATCHER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid uuid regex")
});

static UUID_PATH_MATCHER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$")
        .expect("valid uuid path regex")
});

/// True when `s` is a lowercase canonical UUID and nothing else.
pub fn is_valid_uuid(s: &str) -> bool {
    UUID_MATCHER.is_match(s)
}

/// Extract the UUID held in the last path segment of `url`.
pub fn extract_uuid(url: &str) -> Option<&str> {
    UUID_PATH_MATCHER
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Split a user-supplied list on whitespace and commas, keeping valid UUIDs.
pub fn parse_uuid_list(list: &str) -> Vec<String> {
    let mut uuids = Vec::new();
    for token in list.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        if is_valid_uuid(token) {
            uuids.push(token.to_string());
        } else {
            warn!(token, "discarding invalid UUID");
        }
    }
    uuids
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "3c1f5a2e-7b1d-4c5e-9a8f-0123456789ab";

    #[test]
    fn accepts_canonical_uuid() {
        assert!(is_valid_uuid(ID));
    }

    #[test]
    fn rejects_malformed_uuids() {
        assert!(!is_valid_uuid(&ID.to_uppercase()));
        assert!(!is_valid_uuid("3c1f5a2-7b1d-4c5e-9a8f-0123456789ab"));
        assert!(!is_valid_uuid("3c1f5a2e-7b1d-4c5e-9a8f-0123456789abc"));
        assert!(!is_valid_uuid(&format!(" {}", ID)));
        assert!(!is_valid_uuid(&format!("{}x", ID)));
        assert!(!is_valid_uuid(""));
    }

    #[test]
    fn extracts_trailing_uuid() {
        let url = format!("https://x/content/{}", ID);
        assert_eq!(extract_uuid(&url), Some(ID));
    }

    #[test]
    fn extract_fails_without_trailing_uuid() {
        assert_eq!(extract_uuid("https://x/content/not-a-uuid"), None);
        assert_eq!(extract_uuid(&format!("https://x/content?id={}", ID)), None);
        assert_eq!(extract_uuid(&format!("https://x/{}/images", ID)), None);
        assert_eq!(extract_uuid(ID), None);
    }

    #[test]
    fn parses_mixed_separators() {
        let other = "00000000-0000-0000-0000-000000000001";
        let list = format!("{}, {}  bogus,{}", ID, other, ID);
        assert_eq!(parse_uuid_list(&list), vec![ID, other, ID]);
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(parse_uuid_list("  ,, ").is_empty());
    }
}
