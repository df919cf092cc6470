//! Glob-to-regex compilation and first-match-wins lookup.
//!
//! A pattern such as `*.example.com/shop` becomes
//! `^https?://.*\.example\.com/shop.*$` (case-insensitive): every literal
//! piece is regex-escaped, each `*` matches any (possibly empty) character
//! sequence, the URL must start with `http://` or `https://` directly followed
//! by the pattern, and anything may trail it.

use crate::mapping::{PatternEntry, PatternMapping};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Upper bound on the compiled program size of a single pattern
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern '{pattern}' failed to compile: {source}")]
    Compile {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled restricted-site pattern
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    /// Compile a glob pattern into a case-insensitive URL matcher.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let source = format!("^https?://{body}.*$");

        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|source| PatternError::Compile {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self { regex })
    }

    /// Test a URL against this pattern
    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    /// The generated regular expression source
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Whether a URL uses the `http` or `https` scheme (case-insensitive).
///
/// Only such URLs are ever checked against the mapping.
pub fn is_web_url(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    !rest.is_empty() && (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
}

/// Scan the mapping in order and return the first entry whose pattern matches.
///
/// Patterns that fail to compile are logged and skipped.
pub fn find_match<'a>(mapping: &'a PatternMapping, url: &str) -> Option<&'a PatternEntry> {
    mapping.iter().find(|entry| match PatternMatcher::compile(&entry.pattern) {
        Ok(matcher) => matcher.is_match(url),
        Err(e) => {
            log::warn!("Skipping restricted pattern: {}", e);
            false
        }
    })
}
