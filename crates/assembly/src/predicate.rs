//! Metadata and tag predicates.
//!
//! Both predicates are built from `key` or `key=value` tokens, as given on
//! the command line (`--metadata integ=sfn`, `--tag team`). A token is split
//! once on its first `=`, so `first=a,second` is the key `first` with the
//! value `a,second`. A bare `key` (or `key=`) only requires the key to be
//! present. When a key is repeated the last token wins.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Parsed `key[=value]` tokens shared by both predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct KeyValuePattern {
    entries: BTreeMap<String, Option<String>>,
}

impl KeyValuePattern {
    fn parse<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = BTreeMap::new();
        for token in tokens {
            let (key, value) = match token.as_ref().split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (token.as_ref(), None),
            };
            let value = value.filter(|v| !v.is_empty()).map(str::to_string);
            entries.insert(key.to_string(), value);
        }
        Self { entries }
    }

    /// Check every entry against a lookup that returns the subject's value for a key.
    ///
    /// The lookup returns `None` when the key is absent and `Some(None)` when
    /// the key is present with a value that is not a string.
    fn matches_with<'a, F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<Option<&'a str>>,
    {
        self.entries.iter().all(|(key, expected)| match lookup(key) {
            None => false,
            Some(actual) => match expected {
                None => true,
                Some(expected) => actual == Some(expected.as_str()),
            },
        })
    }
}

/// Matches a resource's `Metadata` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataMatcher {
    pattern: KeyValuePattern,
}

impl MetadataMatcher {
    /// Build a matcher from `key` / `key=value` tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            pattern: KeyValuePattern::parse(tokens),
        }
    }

    /// Whether the matcher has no entries (and so accepts everything).
    pub fn is_empty(&self) -> bool {
        self.pattern.entries.is_empty()
    }

    /// Match against a metadata mapping.
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        self.pattern
            .matches_with(|key| metadata.get(key).map(Value::as_str))
    }
}

/// Matches a resource's tag list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMatcher {
    pattern: KeyValuePattern,
}

impl TagMatcher {
    /// Build a matcher from `key` / `key=value` tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            pattern: KeyValuePattern::parse(tokens),
        }
    }

    /// Whether the matcher has no entries (and so accepts everything).
    pub fn is_empty(&self) -> bool {
        self.pattern.entries.is_empty()
    }

    /// Match against a resource's `Tags` property.
    ///
    /// Accepts the `[{"Key": .., "Value": ..}]` list form and the plain
    /// `{key: value}` map form. A resource without tags only matches an
    /// empty matcher.
    pub fn matches(&self, tags: Option<&Value>) -> bool {
        if self.is_empty() {
            return true;
        }

        match tags {
            Some(Value::Array(list)) => self.pattern.matches_with(|key| {
                list.iter()
                    .rev()
                    .find(|tag| tag.get("Key").and_then(Value::as_str) == Some(key))
                    .map(|tag| tag.get("Value").and_then(Value::as_str))
            }),
            Some(Value::Object(map)) => self
                .pattern
                .matches_with(|key| map.get(key).map(Value::as_str)),
            Some(other) => {
                log::warn!("Ignoring tags that are neither a list nor a map: {other}");
                false
            }
            None => false,
        }
    }
}
