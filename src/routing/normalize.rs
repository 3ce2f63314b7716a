//! Fallback path normalization.
//!
//! Turns a concrete path into a bounded-cardinality label when no registered
//! pattern matches: purely numeric segments become `:id`, UUID-shaped
//! segments become `:uuid`. Everything else is kept as-is.

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder for numeric identifiers.
pub const ID_PLACEHOLDER: &str = ":id";

/// Placeholder for UUIDs.
pub const UUID_PLACEHOLDER: &str = ":uuid";

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid segment regex is valid")
});

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Normalize a query-free path into a templated label. Total and idempotent.
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    path.split('/')
        .map(|segment| {
            if is_numeric(segment) {
                ID_PLACEHOLDER
            } else if UUID_SEGMENT.is_match(segment) {
                UUID_PLACEHOLDER
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_numeric_segments() {
        assert_eq!(normalize("/users/42"), "/users/:id");
        assert_eq!(normalize("/users/42/posts/7"), "/users/:id/posts/:id");
    }

    #[test]
    fn test_uuid_segments() {
        assert_eq!(
            normalize("/orders/123e4567-e89b-12d3-a456-426614174000"),
            "/orders/:uuid"
        );
        assert_eq!(
            normalize("/orders/123E4567-E89B-12D3-A456-426614174000/lines/3"),
            "/orders/:uuid/lines/:id"
        );
    }

    #[test]
    fn test_partial_matches_untouched() {
        assert_eq!(normalize("/v1/items"), "/v1/items");
        assert_eq!(normalize("/items/123abc"), "/items/123abc");
        assert_eq!(normalize("/items/123e4567-e89b"), "/items/123e4567-e89b");
    }

    #[test]
    fn test_static_paths_unchanged() {
        assert_eq!(normalize("/health/ready"), "/health/ready");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn test_empty_path_is_root() {
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn test_idempotent() {
        for path in [
            "/users/42",
            "/orders/123e4567-e89b-12d3-a456-426614174000/lines/3",
            "/a//b/",
            "weird",
            "",
        ] {
            let once = normalize(path);
            assert_eq!(normalize(&once), once, "not idempotent for {path:?}");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_normalize_is_idempotent(path in "(/([0-9]{1,6}|[a-z]{1,8}|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})){0,6}") {
            let once = normalize(&path);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_normalize_is_idempotent_on_arbitrary_text(path in "[ -~]{0,40}") {
            let once = normalize(&path);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
