//! Parser for the remote restricted-site list.
//!
//! The list is line oriented UTF-8 text:
//!
//! ```text
//! # comment
//! example.com:This site sells your data
//! *.tracker.net/ads:Ad network: tracks you across sites
//! ```
//!
//! A leading byte-order mark is ignored. Each line is trimmed. Blank lines
//! and lines starting with `#` are ignored. The rest split on the first `:`
//! only, so messages may contain colons. A line whose pattern or message is
//! empty after trimming is skipped without failing the rest of the list.

use crate::mapping::PatternMapping;
use serde::{Deserialize, Serialize};

/// Line counts gathered while parsing a list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Lines in the input, including blanks and comments
    pub total_lines: usize,
    pub blank_lines: usize,
    pub comment_lines: usize,
    /// Lines skipped because they had no colon or an empty side
    pub malformed_lines: usize,
    /// Lines whose pattern was already seen earlier in the list
    pub duplicate_patterns: usize,
    /// Unique patterns in the resulting mapping
    pub entries: usize,
}

/// Result of parsing a list
#[derive(Debug, Clone, Default)]
pub struct ParsedList {
    pub mapping: PatternMapping,
    pub stats: SyncStats,
}

/// Split a trimmed, non-comment line into `(pattern, message)`.
///
/// Returns `None` for malformed lines.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (pattern, message) = line.split_once(':')?;
    let pattern = pattern.trim();
    let message = message.trim();
    if pattern.is_empty() || message.is_empty() {
        return None;
    }
    Some((pattern, message))
}

/// Parse the full list text into an ordered mapping plus line statistics.
pub fn parse_list(text: &str) -> ParsedList {
    let mut parsed = ParsedList::default();
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for raw in text.lines() {
        parsed.stats.total_lines += 1;
        let line = raw.trim();

        if line.is_empty() {
            parsed.stats.blank_lines += 1;
            continue;
        }
        if line.starts_with('#') {
            parsed.stats.comment_lines += 1;
            continue;
        }

        match parse_line(line) {
            Some((pattern, message)) => {
                if parsed.mapping.insert(pattern, message) {
                    parsed.stats.duplicate_patterns += 1;
                }
            }
            None => {
                log::trace!("Skipping malformed list line: {:?}", line);
                parsed.stats.malformed_lines += 1;
            }
        }
    }

    parsed.stats.entries = parsed.mapping.len();
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_line() {
        assert_eq!(
            parse_line("example.com:Sells your data"),
            Some(("example.com", "Sells your data"))
        );
    }

    #[test]
    fn test_splits_on_first_colon_only() {
        assert_eq!(
            parse_line("shop.example:Warning: fake reviews: everywhere"),
            Some(("shop.example", "Warning: fake reviews: everywhere"))
        );
    }

    #[test]
    fn test_trims_both_sides() {
        assert_eq!(
            parse_line("  a.com  :   message   "),
            Some(("a.com", "message"))
        );
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!(parse_line("no colon here"), None);
        assert_eq!(parse_line(":message without pattern"), None);
        assert_eq!(parse_line("pattern-without-message:"), None);
        assert_eq!(parse_line("pattern:    "), None);
        assert_eq!(parse_line("   :   "), None);
    }

    #[test]
    fn test_parse_list_skips_comments_and_blanks() {
        let text = "# header\n\n  a.com:first\n   # indented comment\nb.com:second\n";
        let parsed = parse_list(text);

        assert_eq!(parsed.mapping.len(), 2);
        assert_eq!(parsed.mapping.get("a.com"), Some("first"));
        assert_eq!(parsed.mapping.get("b.com"), Some("second"));
        assert_eq!(parsed.stats.total_lines, 5);
        assert_eq!(parsed.stats.comment_lines, 2);
        assert_eq!(parsed.stats.blank_lines, 1);
        assert_eq!(parsed.stats.entries, 2);
    }

    #[test]
    fn test_leading_byte_order_mark_is_ignored() {
        let parsed = parse_list("\u{feff}a.com:msg\nb.com:two\n");
        let patterns: Vec<&str> = parsed.mapping.iter().map(|e| e.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["a.com", "b.com"]);
        assert!(crate::pattern::find_match(&parsed.mapping, "https://a.com/").is_some());

        let parsed = parse_list("\u{feff}# comment: not an entry\nb.com:two\n");
        assert_eq!(parsed.stats.comment_lines, 1);
        assert_eq!(parsed.stats.entries, 1);
        assert_eq!(parsed.mapping.get("b.com"), Some("two"));
    }

    #[test]
    fn test_malformed_line_does_not_abort() {
        let text = "a.com:one\ngarbage\nb.com:\nc.com:three";
        let parsed = parse_list(text);

        let patterns: Vec<&str> = parsed.mapping.iter().map(|e| e.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["a.com", "c.com"]);
        assert_eq!(parsed.stats.malformed_lines, 2);
    }

    #[test]
    fn test_all_malformed_yields_empty_mapping() {
        let parsed = parse_list("nothing\nuseful:\n:here");
        assert!(parsed.mapping.is_empty());
        assert_eq!(parsed.stats.malformed_lines, 3);
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = parse_list("a.com:one\r\nb.com:two\r\n");
        assert_eq!(parsed.mapping.get("a.com"), Some("one"));
        assert_eq!(parsed.mapping.get("b.com"), Some("two"));
    }

    #[test]
    fn test_duplicate_pattern_counts() {
        let parsed = parse_list("a.com:old\nb.com:other\na.com:new");
        assert_eq!(parsed.stats.duplicate_patterns, 1);
        assert_eq!(parsed.mapping.entries()[0].message, "new");
        assert_eq!(parsed.stats.entries, 2);
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse_list("");
        assert!(parsed.mapping.is_empty());
        assert_eq!(parsed.stats, SyncStats::default());
    }
}
