use super::*;

#[test]
fn canonicalize_lowercases_scheme_and_host() {
    assert_eq!(
        canonicalize("HTTP://Example.COM/Path"),
        canonicalize("http://example.com/Path")
    );
}

#[test]
fn canonicalize_strips_fragment() {
    assert_eq!(
        canonicalize("http://example.com/a#section"),
        canonicalize("http://example.com/a")
    );
}

#[test]
fn canonicalize_sorts_query_params() {
    assert_eq!(
        canonicalize("http://example.com/a?b=2&a=1"),
        canonicalize("http://example.com/a?a=1&b=2")
    );
}

#[test]
fn canonicalize_trims_trailing_slash_variance() {
    assert_eq!(
        canonicalize("http://example.com/a/"),
        canonicalize("http://example.com/a")
    );
}

#[test]
fn canonicalize_never_panics_on_malformed_input() {
    let result = canonicalize("not a url at all");
    assert_eq!(result, "not a url at all");
}

#[test]
fn seed_item_starts_at_depth_zero() {
    let item = UrlQueueItem::seed("http://example.com");
    assert_eq!(item.depth, 0);
    assert!(item.discovered_by.is_none());
}
