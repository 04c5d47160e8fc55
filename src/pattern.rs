//! URL patterns for pattern rules.
//!
//! A pattern is either a compiled [`Regex`] or a regex literal written the way
//! it appears in extension configuration, `/body/flags`. Anything that does
//! not parse becomes [`UrlPattern::Invalid`], which never matches: a broken
//! pattern in a development config silences the trigger instead of crashing
//! the background process.
//!
//! Pattern bodies use the syntax of the `regex` crate. Lookaround and
//! backreferences are not supported, so literals relying on them are
//! [`UrlPattern::Invalid`].

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::ValidationError;

/// Pattern matched against a tab URL.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Compiled, usable pattern.
    Regex(Regex),
    /// Input that was not a pattern. Never matches.
    Invalid {
        /// The rejected input, kept for introspection.
        source: String,
    },
}

impl UrlPattern {
    /// Strictly parses a regex literal of the form `/body/flags`.
    ///
    /// Supported flags: `i`, `m`, `s`, `x`. The flags `g`, `y`, `u` and `d`
    /// are accepted and ignored since a single match test is stateless and
    /// always Unicode-aware here.
    pub fn compile(literal: &str) -> Result<Regex, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidPattern {
            pattern: literal.to_string(),
            reason: reason.to_string(),
        };

        let rest = literal
            .strip_prefix('/')
            .ok_or_else(|| invalid("pattern must be a /body/flags literal"))?;
        let end = rest
            .rfind('/')
            .ok_or_else(|| invalid("missing closing delimiter"))?;
        let (body, flags) = (&rest[..end], &rest[end + 1..]);

        if body.is_empty() {
            return Err(invalid("empty pattern body"));
        }

        let mut builder = RegexBuilder::new(body);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                'g' | 'y' | 'u' | 'd' => {}
                other => return Err(invalid(&format!("unsupported flag '{other}'"))),
            }
        }

        builder.build().map_err(|e| invalid(&e.to_string()))
    }

    /// Lenient parse: invalid input yields [`UrlPattern::Invalid`].
    #[must_use]
    pub fn parse(literal: &str) -> Self {
        match Self::compile(literal) {
            Ok(re) => Self::Regex(re),
            Err(err) => {
                tracing::debug!(error = %err, "pattern degraded to never-match");
                Self::Invalid {
                    source: literal.to_string(),
                }
            }
        }
    }

    /// Tests the pattern against a URL.
    #[must_use]
    pub fn is_match(&self, url: &str) -> bool {
        match self {
            Self::Regex(re) => re.is_match(url),
            Self::Invalid { .. } => false,
        }
    }

    /// Returns true if the pattern can ever match.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Regex(_))
    }

    /// The pattern source: regex body for compiled patterns, raw input otherwise.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Regex(re) => re.as_str(),
            Self::Invalid { source } => source,
        }
    }
}

impl From<Regex> for UrlPattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

impl From<&Regex> for UrlPattern {
    fn from(re: &Regex) -> Self {
        Self::Regex(re.clone())
    }
}

impl From<&str> for UrlPattern {
    fn from(literal: &str) -> Self {
        Self::parse(literal)
    }
}

impl From<String> for UrlPattern {
    fn from(literal: String) -> Self {
        Self::parse(&literal)
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
            Self::Invalid { source } => write!(f, "invalid({source})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_with_escaped_slashes_compiles() {
        let p = UrlPattern::from(r"/^https:\/\/a\./");
        assert!(p.is_valid());
        assert!(p.is_match("https://a.test/x"));
        assert!(!p.is_match("http://a.test"));
    }

    #[test]
    fn case_insensitive_flag() {
        let p = UrlPattern::from("/^HTTPS:/i");
        assert!(p.is_match("https://a.test"));

        let p = UrlPattern::from("/^HTTPS:/");
        assert!(!p.is_match("https://a.test"));
    }

    #[test]
    fn stateless_flags_are_ignored() {
        let p = UrlPattern::from("/a\\.test/gu");
        assert!(p.is_valid());
        assert!(p.is_match("https://a.test"));
        // A global flag must not make repeated tests alternate.
        assert!(p.is_match("https://a.test"));
    }

    #[test]
    fn bare_string_is_invalid() {
        let p = UrlPattern::from("not-a-pattern");
        assert!(!p.is_valid());
        assert!(!p.is_match("not-a-pattern"));
        assert_eq!(p.as_str(), "not-a-pattern");
    }

    #[test]
    fn compile_reports_reasons() {
        for bad in ["", "/", "//", "/abc", "/a/q", "/(unclosed/"] {
            let err = UrlPattern::compile(bad).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidPattern { .. }),
                "expected InvalidPattern for {bad:?}"
            );
        }
    }

    #[test]
    fn compiled_regex_is_used_verbatim() {
        let re = Regex::new(r"^https://a\.").unwrap();
        let p = UrlPattern::from(&re);
        assert!(p.is_match("https://a.test"));
        assert_eq!(p.to_string(), r"/^https://a\./");
    }
}
