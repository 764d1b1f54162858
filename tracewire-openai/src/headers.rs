use http::HeaderMap;

pub const CACHED_HEADER: &str = "x-bt-cached";
pub const LEGACY_CACHED_HEADER: &str = "x-cached";

/// The `cached` metric for a response: `Some(1)` when the cache header says
/// `true` or `hit`, `Some(0)` for any other value, `None` without a header.
/// The current header wins over the legacy one.
pub fn cache_hit(headers: &HeaderMap) -> Option<u64> {
    let value = [CACHED_HEADER, LEGACY_CACHED_HEADER]
        .into_iter()
        .filter_map(|name| headers.get(name).and_then(|value| value.to_str().ok()))
        .find(|value| !value.is_empty())?;
    let hit = value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("hit");
    Some(u64::from(hit))
}
