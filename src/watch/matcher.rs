// src/watch/matcher.rs

//! Pattern matcher.
//!
//! Decides whether a concrete absolute path satisfies a compiled
//! [`WatchSpec`]. Within a segment, `*` and `?` never cross a `/` and
//! `[...]` is a character class. A single `{a,b,c}` group per segment is
//! expanded into alternatives before matching.

use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use tracing::warn;

use crate::watch::pattern::WatchSpec;

/// One `**`-separated fragment of a pattern.
///
/// Globs are compiled eagerly, but a compile error is stored rather than
/// returned so that a malformed pattern only ever degrades to "no match".
#[derive(Clone)]
pub(crate) struct Segment {
    raw: String,
    /// Number of path components this segment spans (0 when empty).
    width: usize,
    compiled: Result<Vec<GlobMatcher>, String>,
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("raw", &self.raw)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

impl Segment {
    pub(crate) fn new(raw: &str) -> Self {
        if raw.is_empty() {
            return Self {
                raw: String::new(),
                width: 0,
                compiled: Ok(Vec::new()),
            };
        }

        let compiled = expand_braces(raw)
            .iter()
            .map(|alt| {
                GlobBuilder::new(alt)
                    .literal_separator(true)
                    .backslash_escape(true)
                    .build()
                    .map(|g| g.compile_matcher())
                    .map_err(|e| e.to_string())
            })
            .collect();

        Self {
            raw: raw.to_string(),
            width: raw.matches('/').count() + 1,
            compiled,
        }
    }

    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }

    fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Match this segment against a slash-joined run of components.
    fn is_match(&self, candidate: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        match &self.compiled {
            Ok(alternatives) => alternatives.iter().any(|m| m.is_match(candidate)),
            Err(reason) => {
                warn!(segment = %self.raw, %reason, "malformed glob; treating as no match");
                false
            }
        }
    }
}

impl WatchSpec {
    /// Returns true if `path` (absolute) satisfies this pattern.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(path) = path.to_str() else {
            return false;
        };
        let Some(remainder) = strip_root(self.root_dir(), path) else {
            return false;
        };

        match self.compiled_segments() {
            [] => false,
            [only] => only.is_match(remainder),
            segments => match_recursive(segments, remainder),
        }
    }
}

/// Remove `root` and exactly one following separator from `path`.
///
/// Returns `None` when `path` is not `root` itself or located below it.
/// The comparison is component-aware: `/pathology` is not below `/path`.
pub fn strip_root<'a>(root: &str, path: &'a str) -> Option<&'a str> {
    let rest = path.strip_prefix(root)?;
    if rest.is_empty() || root.ends_with('/') {
        return Some(rest);
    }
    rest.strip_prefix('/')
}

/// Expand the first `{a,b,c}` group of `segment` into one candidate per
/// alternative, keeping the surrounding text fixed.
///
/// Segments without a complete group are returned unchanged.
pub fn expand_braces(segment: &str) -> Vec<String> {
    let Some(open) = segment.find('{') else {
        return vec![segment.to_string()];
    };
    let Some(close) = segment[open..].find('}').map(|i| open + i) else {
        return vec![segment.to_string()];
    };

    let prefix = &segment[..open];
    let suffix = &segment[close + 1..];
    segment[open + 1..close]
        .split(',')
        .map(|alt| format!("{prefix}{alt}{suffix}"))
        .collect()
}

/// Segment-by-segment matching for patterns containing `**`.
///
/// Every segment but the last scans forward from the cursor for the first
/// contiguous run of components it matches. The last segment is anchored to
/// the end of the path, and must not overlap what earlier segments consumed.
/// Empty segments consume nothing.
fn match_recursive(segments: &[Segment], remainder: &str) -> bool {
    let components: Vec<&str> = if remainder.is_empty() {
        Vec::new()
    } else {
        remainder.split('/').collect()
    };
    let total = components.len();
    let last = segments.len() - 1;
    let mut cursor = 0;

    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        let width = segment.width;

        if index == last {
            let Some(anchor) = total.checked_sub(width) else {
                return false;
            };
            return anchor >= cursor && segment.is_match(&components[anchor..].join("/"));
        }

        let fits = |start: usize| segment.is_match(&components[start..start + width].join("/"));
        let found = (cursor..=total.saturating_sub(width))
            .filter(|start| start + width <= total)
            .find(|&start| fits(start));

        match found {
            Some(start) => cursor = start + width,
            None => return false,
        }
    }

    true
}
