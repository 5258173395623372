// src/watch/pattern.rs

//! Pattern compiler.
//!
//! A user pattern such as `src/**/*.{php,twig}` is split into:
//! - a static root directory (`/abs/project/src`) that the native watcher
//!   observes recursively, and
//! - an ordered list of segments separated by the recursive marker `**`,
//!   which the matcher applies to paths below that root.
//!
//! Compilation is purely lexical: the filesystem is never consulted, so a
//! pattern may name a directory that does not exist yet. Glob syntax errors
//! are not reported here; they surface at match time (see [`super::matcher`]).

use std::fmt;
use std::path::Path;

use crate::errors::{Result, WatchError};
use crate::watch::matcher::Segment;

/// Characters that turn a path component into a glob component.
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Separates independently matched segments.
const RECURSIVE_MARKER: &str = "**";

/// Compiled representation of one user pattern.
#[derive(Debug, Clone)]
pub struct WatchSpec {
    pattern: String,
    root_dir: String,
    segments: Vec<Segment>,
}

impl WatchSpec {
    /// Compile a pattern, resolving relative patterns against the current
    /// working directory.
    pub fn compile(pattern: &str) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| WatchError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: format!("cannot resolve working directory: {e}"),
        })?;
        Self::compile_with_base(pattern, &cwd)
    }

    /// Compile a pattern, resolving relative patterns against `base`.
    ///
    /// `base` must be absolute.
    pub fn compile_with_base(pattern: &str, base: &Path) -> Result<Self> {
        let invalid = |reason: &str| WatchError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let base = base
            .to_str()
            .ok_or_else(|| invalid("base directory is not valid UTF-8"))?;
        if !base.starts_with('/') {
            return Err(invalid("base directory is not absolute"));
        }

        let parts = resolve_components(pattern, base);
        let last = parts.len().saturating_sub(1);

        let boundary = parts
            .iter()
            .enumerate()
            .position(|(i, part)| part.contains(GLOB_META) || (i == last && part.contains('.')));

        let (root_parts, rest_parts) = match boundary {
            Some(b) => parts.split_at(b),
            None => (parts.as_slice(), &[][..]),
        };

        let root_dir = normalize_root(&root_parts.join("/"));
        let remainder = rest_parts.join("/");

        let segments = remainder
            .split(RECURSIVE_MARKER)
            .map(|s| Segment::new(s.trim_matches('/')))
            .collect();

        Ok(Self {
            pattern: pattern.to_string(),
            root_dir,
            segments,
        })
    }

    /// The pattern exactly as supplied by the caller.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Absolute, slash-normalized root directory (no trailing slash unless it
    /// is `/` itself).
    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    /// Root directory as a path, for handing to the native watcher.
    pub fn root_path(&self) -> &Path {
        Path::new(&self.root_dir)
    }

    /// Raw segment strings, in match order.
    pub fn segments(&self) -> Vec<&str> {
        self.segments.iter().map(Segment::raw).collect()
    }

    /// True when the pattern contained at least one `**`.
    pub fn is_recursive(&self) -> bool {
        self.segments.len() > 1
    }

    pub(crate) fn compiled_segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for WatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (root {}, segments {:?})",
            self.pattern,
            self.root_dir,
            self.segments()
        )
    }
}

/// Join `pattern` onto `base` when relative and collapse `.`, `..` and empty
/// components, returning the remaining components.
fn resolve_components(pattern: &str, base: &str) -> Vec<String> {
    let joined = if pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("{base}/{pattern}")
    };

    let mut parts: Vec<String> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p.to_string()),
        }
    }
    parts
}

/// Strip trailing slashes and force exactly one leading slash.
fn normalize_root(joined: &str) -> String {
    format!("/{}", joined.trim_matches('/'))
}
