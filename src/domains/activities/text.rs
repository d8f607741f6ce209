//! Text cleaning and URL helpers used by the extractor.

use url::Url;

/// Collapse whitespace runs to a single space and trim.
///
/// Absent input and input that is empty after cleaning both yield `None`.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let cleaned = raw?.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Parse a counter from text such as `浏览1,234次`, keeping only ASCII digits.
///
/// Counters too large for `u64` saturate to `u64::MAX`.
pub fn parse_count(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(u64::MAX))
}

/// Resolve a link found on the page to an absolute URL.
///
/// Scheme-relative links get `https:`; relative paths resolve against `base`.
pub fn absolute_url(raw: Option<&str>, base: &Url) -> Option<String> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }
    if raw.starts_with("//") {
        return Some(format!("https:{raw}"));
    }
    base.join(raw).ok().map(String::from)
}

/// Numeric id from the first `/activity/<digits>` occurrence in `url`.
pub fn activity_id(url: &str) -> Option<u64> {
    const MARKER: &str = "/activity/";

    url.match_indices(MARKER).find_map(|(start, _)| {
        let rest = &url[start + MARKER.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..end].parse().ok()
    })
}
