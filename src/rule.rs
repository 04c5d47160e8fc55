//! Rules and rule sets.
//!
//! A [`RuleSet`] is an ordered, append-only list of predicates over a
//! [`TabDescriptor`]. Validation is a short-circuiting logical AND in
//! registration order: once a rule fails, later rules are not invoked.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, TriggerResult, ValidationError};
use crate::pattern::UrlPattern;
use crate::tab::TabDescriptor;

/// Boxed user predicate.
pub type Predicate = dyn Fn(&TabDescriptor) -> bool + Send + Sync;

/// Origin kind of a rule, for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Arbitrary predicate.
    Custom,
    /// Exact URL equality.
    UrlExact,
    /// URL pattern match.
    UrlPattern,
}

/// A single predicate over a tab descriptor.
#[derive(Clone)]
pub enum Rule {
    /// User predicate, optionally labelled.
    Custom {
        /// Label shown in debug output.
        name: Option<String>,
        /// The predicate itself.
        predicate: Arc<Predicate>,
    },
    /// `tab.url` must equal this string.
    UrlExact(String),
    /// `tab.url` must match this pattern.
    UrlPattern(UrlPattern),
}

impl Rule {
    /// The rule's origin kind.
    #[must_use]
    pub const fn kind(&self) -> RuleKind {
        match self {
            Self::Custom { .. } => RuleKind::Custom,
            Self::UrlExact(_) => RuleKind::UrlExact,
            Self::UrlPattern(_) => RuleKind::UrlPattern,
        }
    }

    /// Evaluates the rule. Panics raised by custom predicates propagate.
    #[must_use]
    pub fn evaluate(&self, tab: &TabDescriptor) -> bool {
        match self {
            Self::Custom { predicate, .. } => predicate(tab),
            Self::UrlExact(expected) => tab.url() == Some(expected.as_str()),
            Self::UrlPattern(pattern) => tab.url().is_some_and(|url| pattern.is_match(url)),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom { name, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .finish_non_exhaustive(),
            Self::UrlExact(url) => f.debug_tuple("UrlExact").field(url).finish(),
            Self::UrlPattern(pattern) => f.debug_tuple("UrlPattern").field(pattern).finish(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom { name: Some(name), .. } => write!(f, "custom({name})"),
            Self::Custom { name: None, .. } => write!(f, "custom"),
            Self::UrlExact(url) => write!(f, "url == {url}"),
            Self::UrlPattern(pattern) => write!(f, "url ~ {pattern}"),
        }
    }
}

/// Declarative rule, as written in a JSON rule file.
///
/// Custom predicates are code and have no declarative form.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleSpec {
    UrlExact { url: String },
    UrlPattern { pattern: String },
}

impl From<RuleSpec> for Rule {
    fn from(spec: RuleSpec) -> Self {
        match spec {
            RuleSpec::UrlExact { url } => Self::UrlExact(url),
            RuleSpec::UrlPattern { pattern } => Self::UrlPattern(UrlPattern::parse(&pattern)),
        }
    }
}

/// Ordered, append-only collection of rules combined with all-must-pass semantics.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty rule set. An empty set validates every tab.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a rule set from declarative specs, in order.
    pub fn from_specs(specs: impl IntoIterator<Item = RuleSpec>) -> Self {
        Self {
            rules: specs.into_iter().map(Rule::from).collect(),
        }
    }

    /// Parses a JSON array of rule specs.
    ///
    /// Malformed JSON is an error; a well-formed spec with a bad pattern still
    /// loads and degrades to never-match.
    pub fn from_json(json: &str) -> TriggerResult<Self> {
        let specs: Vec<RuleSpec> =
            serde_json::from_str(json).map_err(|e| ValidationError::InvalidRuleSpec {
                reason: e.to_string(),
            })?;
        Ok(Self::from_specs(specs))
    }

    /// Reads and parses a JSON rule file.
    pub fn from_json_file(path: impl AsRef<Path>) -> TriggerResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ExecutionError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Registers an arbitrary predicate.
    pub fn add_custom_rule<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&TabDescriptor) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule::Custom {
            name: None,
            predicate: Arc::new(predicate),
        });
        self
    }

    /// Registers a labelled predicate.
    pub fn add_named_rule<F>(&mut self, name: impl Into<String>, predicate: F) -> &mut Self
    where
        F: Fn(&TabDescriptor) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule::Custom {
            name: Some(name.into()),
            predicate: Arc::new(predicate),
        });
        self
    }

    /// Registers an exact URL match.
    pub fn add_url_rule(&mut self, url: impl Into<String>) -> &mut Self {
        self.rules.push(Rule::UrlExact(url.into()));
        self
    }

    /// Registers a URL pattern match. Invalid patterns never match.
    ///
    /// Literals using syntax the `regex` crate lacks, such as lookaround or
    /// backreferences, are invalid and logged at `warn`.
    pub fn add_pattern_rule(&mut self, pattern: impl Into<UrlPattern>) -> &mut Self {
        let pattern = pattern.into();
        if !pattern.is_valid() {
            tracing::warn!(pattern = pattern.as_str(), "registered never-matching pattern rule");
        }
        self.rules.push(Rule::UrlPattern(pattern));
        self
    }

    /// Registers a URL pattern match, rejecting invalid patterns.
    pub fn try_add_pattern_rule(&mut self, literal: &str) -> TriggerResult<&mut Self> {
        let re = UrlPattern::compile(literal)?;
        self.rules.push(Rule::UrlPattern(UrlPattern::Regex(re)));
        Ok(self)
    }

    /// Returns true if every rule accepts the tab.
    ///
    /// Rules run in registration order and evaluation stops at the first
    /// failure. A panicking custom rule propagates to the caller.
    #[must_use]
    pub fn validate(&self, tab: &TabDescriptor) -> bool {
        self.rules.iter().all(|rule| rule.evaluate(tab))
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Kinds of the registered rules in registration order.
    #[must_use]
    pub fn kinds(&self) -> Vec<RuleKind> {
        self.rules.iter().map(Rule::kind).collect()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl Extend<Rule> for RuleSet {
    fn extend<I: IntoIterator<Item = Rule>>(&mut self, iter: I) {
        self.rules.extend(iter);
    }
}
