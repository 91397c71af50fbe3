use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ip::IpRange;

/// A case-insensitive regular expression that matches at the start of a
/// value.
///
/// Only the pattern text is serialized; the regex is rebuilt on
/// deserialization, so an artifact carrying an invalid pattern fails to
/// decode.
#[derive(Clone)]
pub struct PolicyRegex {
    pattern: String,
    regex: Regex,
}

impl PolicyRegex {
    /// Compile a pattern. Matching is anchored at the start of the value but
    /// not at the end: `/^editor/` and `/editor/` behave the same.
    pub fn new(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let regex = RegexBuilder::new(&format!(r"\A(?:{pattern})"))
            .case_insensitive(true)
            .build()?;
        Ok(Self { pattern, regex })
    }

    /// The pattern as written in the policy source.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Test whether the value starts with a match.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl fmt::Debug for PolicyRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PolicyRegex").field(&self.pattern).finish()
    }
}

impl PartialEq for PolicyRegex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for PolicyRegex {}

impl Serialize for PolicyRegex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.pattern)
    }
}

impl<'de> Deserialize<'de> for PolicyRegex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Self::new(pattern).map_err(serde::de::Error::custom)
    }
}

/// A single value expression of a rule row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueMatcher {
    /// A `/.../` expression.
    Regex(PolicyRegex),
    /// A quoted `ip/bits` literal on the `remote_ip` field.
    CidrRange(IpRange),
    /// Any other quoted literal, compared case-insensitively.
    Literal(String),
}

impl ValueMatcher {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Regex(_) => "regex",
            Self::CidrRange(_) => "cidr",
            Self::Literal(_) => "literal",
        }
    }
}

impl fmt::Display for ValueMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
            Self::CidrRange(range) => write!(f, "'{range}'"),
            Self::Literal(s) => write!(f, "'{s}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_is_case_insensitive() {
        let re = PolicyRegex::new("editor").unwrap();
        assert!(re.is_match("EDITOR-en"));
        assert!(re.is_match("editor"));
    }

    #[test]
    fn regex_is_anchored_at_start_only() {
        let re = PolicyRegex::new("edit").unwrap();
        assert!(re.is_match("editors"));
        assert!(!re.is_match("chief-editor"));

        let re = PolicyRegex::new(".*editor").unwrap();
        assert!(re.is_match("chief-editor"));
    }

    #[test]
    fn alternation_stays_anchored() {
        let re = PolicyRegex::new("a|b").unwrap();
        assert!(re.is_match("bob"));
        assert!(!re.is_match("cab"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(PolicyRegex::new("(unclosed").is_err());
    }

    #[test]
    fn regex_equality_uses_pattern() {
        assert_eq!(PolicyRegex::new("x+").unwrap(), PolicyRegex::new("x+").unwrap());
        assert_ne!(PolicyRegex::new("x+").unwrap(), PolicyRegex::new("X+").unwrap());
    }

    #[test]
    fn regex_serializes_as_pattern() {
        let re = PolicyRegex::new("^editor.*").unwrap();
        let json = serde_json::to_string(&re).unwrap();
        assert_eq!(json, "\"^editor.*\"");
        let back: PolicyRegex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, re);
        assert!(back.is_match("Editor-in-chief"));
    }

    #[test]
    fn deserializing_bad_pattern_fails() {
        assert!(serde_json::from_str::<PolicyRegex>("\"(unclosed\"").is_err());
    }

    #[test]
    fn matcher_display() {
        assert_eq!(
            ValueMatcher::Regex(PolicyRegex::new("^a").unwrap()).to_string(),
            "/^a/"
        );
        assert_eq!(ValueMatcher::Literal("x".into()).to_string(), "'x'");
        let range = crate::ip::build_range("10.0.0.0/8").unwrap();
        assert_eq!(ValueMatcher::CidrRange(range).to_string(), "'10.0.0.0/8'");
        assert_eq!(ValueMatcher::CidrRange(range).kind(), "cidr");
    }
}
