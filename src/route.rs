//! Hash-route parsing and path-segment mapping.
//!
//! Documentation SPAs key their content by the URL fragment, either as a
//! query-like `#s=<section>&ss=<subsection>` pair or as a bare `#<section>`.
//! Both forms map onto a two-level `<section>/<subsection>.md` namespace.

use std::collections::HashMap;

pub const UNKNOWN_SECTION: &str = "unknown";
pub const INDEX_SUBSECTION: &str = "index";

const SECTION_KEY: &str = "s";
const SUBSECTION_KEY: &str = "ss";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteIdentity {
    pub section: String,
    pub subsection: String,
}

impl RouteIdentity {
    /// Directory name for the section, never empty.
    pub fn section_segment(&self) -> String {
        segment_or(&self.section, UNKNOWN_SECTION)
    }

    /// File stem for the subsection, never empty.
    pub fn subsection_segment(&self) -> String {
        segment_or(&self.subsection, INDEX_SUBSECTION)
    }
}

/// Returns the raw fragment of `url`, or `None` when it has none (or an empty one).
pub fn fragment_of(url: &str) -> Option<&str> {
    url.split_once('#')
        .map(|(_, fragment)| fragment)
        .filter(|fragment| !fragment.is_empty())
}

/// Parse a navigation URL into its route identity.
///
/// `None` means the URL is not a content route and must be skipped. Malformed
/// key/value fragments never fail; missing keys fall back to the sentinels.
pub fn parse_hash_route(url: &str) -> Option<RouteIdentity> {
    let fragment = fragment_of(url)?;

    if !fragment.contains('=') {
        return Some(RouteIdentity {
            section: fragment.to_string(),
            subsection: INDEX_SUBSECTION.to_string(),
        });
    }

    let params = fragment
        .split('&')
        .filter_map(|part| part.split_once('='))
        .collect::<HashMap<&str, &str>>();

    Some(RouteIdentity {
        section: params
            .get(SECTION_KEY)
            .map(|value| value.to_string())
            .unwrap_or_else(|| UNKNOWN_SECTION.to_string()),
        subsection: params
            .get(SUBSECTION_KEY)
            .map(|value| value.to_string())
            .unwrap_or_else(|| INDEX_SUBSECTION.to_string()),
    })
}

/// Reduce a name to a lowercase `[a-z0-9-]` token with no leading, trailing
/// or doubled hyphens.
///
/// Characters other than ASCII alphanumerics, hyphens and whitespace are
/// dropped; whitespace/hyphen runs become one hyphen. Distinct names may map
/// to the same segment (last write wins on disk).
pub fn sanitize_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch.is_whitespace() {
            pending_hyphen = true;
        }
    }

    out
}

fn segment_or(name: &str, fallback: &str) -> String {
    let segment = sanitize_segment(name);
    if segment.is_empty() {
        fallback.to_string()
    } else {
        segment
    }
}
