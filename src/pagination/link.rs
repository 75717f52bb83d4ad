//! RFC 5988 `Link` header parsing.

use reqwest::header::{HeaderMap, LINK};
use url::Url;

use crate::client::transport::Response;

/// The `rel="next"` target of a response, resolved against its URL.
pub fn parse_next_link(response: &Response) -> Option<Url> {
    next_link(response.headers(), response.url())
}

/// The first `rel="next"` target across every `Link` header in `headers`.
///
/// Entries are split on top-level commas, parameters on top-level
/// semicolons, so commas and semicolons inside `<...>` or quotes are kept.
/// Parameter order and surrounding whitespace do not matter. Relative
/// targets are resolved against `base`; entries that fail to resolve are
/// skipped.
pub fn next_link(headers: &HeaderMap, base: &Url) -> Option<Url> {
    for value in headers.get_all(LINK) {
        let Ok(value) = value.to_str() else {
            tracing::debug!("Ignoring non-UTF-8 Link header");
            continue;
        };

        for entry in split_top_level(value, ',') {
            let mut parts = split_top_level(entry, ';').into_iter();
            let Some(target) = parts.next().and_then(link_target) else {
                continue;
            };
            if !parts.any(is_rel_next) {
                continue;
            }

            match base.join(target) {
                Ok(url) => return Some(url),
                Err(e) => {
                    tracing::warn!(link = %target, error = %e, "Skipping unresolvable next link");
                }
            }
        }
    }
    None
}

fn link_target(segment: &str) -> Option<&str> {
    segment
        .trim()
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .map(str::trim)
}

fn is_rel_next(param: &str) -> bool {
    let Some((key, value)) = param.split_once('=') else {
        return false;
    };
    key.trim().eq_ignore_ascii_case("rel") && unquote(value.trim()) == "next"
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Split on `sep`, ignoring separators inside `<...>` and double quotes.
/// Blank segments are dropped.
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_angle = false;
    let mut in_quotes = false;
    let mut start = 0;

    for (idx, ch) in input.char_indices() {
        match ch {
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            '"' if !in_angle => in_quotes = !in_quotes,
            c if c == sep && !in_angle && !in_quotes => {
                segments.push(&input[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(&input[start..]);

    segments.retain(|s| !s.trim().is_empty());
    segments
}
