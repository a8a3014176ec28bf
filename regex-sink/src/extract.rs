use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;

/// Why one event was dropped without aborting the batch. Malformed shape is
/// tolerated; these are logged and the batch moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    EmptyPayload,
    NoMatch,
    GroupCountMismatch { expected: usize, found: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::EmptyPayload => write!(f, "empty payload"),
            SkipReason::NoMatch => write!(f, "payload does not match the pattern"),
            SkipReason::GroupCountMismatch { expected, found } => write!(
                f,
                "pattern has {found} capture groups but {expected} columns are configured"
            ),
        }
    }
}

/// Outcome of running the pattern over one payload.
#[derive(Debug, PartialEq)]
pub enum Extraction {
    /// Ordered capture group values, one per configured capture column.
    /// A group that did not participate in the match is `None`.
    Matched(Vec<Option<String>>),
    Skipped(SkipReason),
}

/// The compiled extraction pattern. The whole trimmed payload must match;
/// dot always matches newlines so multi-line bodies work.
pub struct PatternExtractor {
    pattern: Regex,
    source: String,
    expected_groups: usize,
}

impl PatternExtractor {
    pub fn new(
        pattern: &str,
        ignore_case: bool,
        expected_groups: usize,
    ) -> Result<Self, ConfigError> {
        // Anchor the pattern ourselves so a substring match never counts.
        let anchored = format!(r"\A(?:{pattern})\z");
        let compiled = RegexBuilder::new(&anchored)
            .dot_matches_new_line(true)
            .case_insensitive(ignore_case)
            .build()?;

        Ok(Self {
            pattern: compiled,
            source: pattern.to_owned(),
            expected_groups,
        })
    }

    /// The configured pattern source, for diagnostics.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn extract(&self, payload: &[u8]) -> Extraction {
        let text = String::from_utf8_lossy(payload);
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Extraction::Skipped(SkipReason::EmptyPayload);
        }

        let found = self.pattern.captures_len() - 1;
        if found != self.expected_groups {
            return Extraction::Skipped(SkipReason::GroupCountMismatch {
                expected: self.expected_groups,
                found,
            });
        }

        match self.pattern.captures(trimmed) {
            Some(captures) => {
                let values = (1..=self.expected_groups)
                    .map(|i| captures.get(i).map(|m| m.as_str().to_owned()))
                    .collect();
                Extraction::Matched(values)
            }
            None => Extraction::Skipped(SkipReason::NoMatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(pattern: &str, groups: usize) -> PatternExtractor {
        PatternExtractor::new(pattern, false, groups).unwrap()
    }

    #[test]
    fn test_matched_groups_in_order() {
        let extraction = extractor(r"(\d+),(\w+)", 2).extract(b"42,hello");

        assert_eq!(
            extraction,
            Extraction::Matched(vec![Some("42".to_owned()), Some("hello".to_owned())])
        );
    }

    #[test]
    fn test_substring_match_is_rejected() {
        let extraction = extractor(r"(\d+)", 1).extract(b"id=42;");

        assert_eq!(extraction, Extraction::Skipped(SkipReason::NoMatch));
    }

    #[test]
    fn test_payload_is_trimmed_before_matching() {
        let extraction = extractor(r"(\d+)", 1).extract(b"  42\n");

        assert_eq!(extraction, Extraction::Matched(vec![Some("42".to_owned())]));
    }

    #[test]
    fn test_dot_matches_newline() {
        let extraction = extractor(r"(.*)", 1).extract(b"line one\nline two");

        assert_eq!(
            extraction,
            Extraction::Matched(vec![Some("line one\nline two".to_owned())])
        );
    }

    #[test]
    fn test_case_insensitive_matching() {
        let extractor = PatternExtractor::new(r"error: (\w+)", true, 1).unwrap();

        assert_eq!(
            extractor.extract(b"ERROR: disk"),
            Extraction::Matched(vec![Some("disk".to_owned())])
        );
    }

    #[test]
    fn test_empty_payload_is_skipped() {
        assert_eq!(
            extractor(r"(.*)", 1).extract(b"   "),
            Extraction::Skipped(SkipReason::EmptyPayload)
        );
        assert_eq!(
            extractor(r"(.*)", 1).extract(b""),
            Extraction::Skipped(SkipReason::EmptyPayload)
        );
    }

    #[test]
    fn test_group_count_mismatch_is_skipped() {
        let extraction = extractor(r"(\d+),(\w+)", 3).extract(b"42,hello");

        assert_eq!(
            extraction,
            Extraction::Skipped(SkipReason::GroupCountMismatch {
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_optional_group_yields_none() {
        let extraction = extractor(r"(\d+)(?:,(\w+))?", 2).extract(b"42");

        assert_eq!(
            extraction,
            Extraction::Matched(vec![Some("42".to_owned()), None])
        );
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        assert!(PatternExtractor::new(r"(unclosed", false, 1).is_err());
    }
}
