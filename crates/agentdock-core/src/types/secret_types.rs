//! Secret (API key) types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Secret names the configuration form knows about
pub const KNOWN_SECRETS: &[&str] = &[
    "OPENAI_API_KEY",
    "OPENAI_ORG_ID",
    "GEMINI_API_KEY",
    "ANTHROPIC_API_KEY",
    "REPLICATE_API_KEY",
];

/// Number of trailing characters a masked value reveals
const MASK_REVEAL: usize = 4;

pub fn is_known_secret(name: &str) -> bool {
    KNOWN_SECRETS.contains(&name)
}

/// Flat mapping from secret name to value, persisted as one JSON object
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SecretSet(BTreeMap<String, String>);

impl SecretSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known secret mapped to an empty value
    pub fn with_known_keys() -> Self {
        Self(
            KNOWN_SECRETS
                .iter()
                .map(|name| (name.to_string(), String::new()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` onto this set; `other` wins on conflicts
    pub fn merge(&mut self, other: &SecretSet) {
        for (name, value) in other.iter() {
            self.0.insert(name.to_string(), value.to_string());
        }
    }

    /// Whether a secret is present with a non-empty value
    pub fn is_available(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Copy of the set with every value masked
    pub fn masked(&self) -> SecretSet {
        Self(
            self.0
                .iter()
                .map(|(name, value)| (name.clone(), mask_secret(value)))
                .collect(),
        )
    }

    /// Entries to inject into a child environment, empty values included
    pub fn env_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
    }
}

impl FromIterator<(String, String)> for SecretSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for SecretSet {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Mask a secret for display, revealing at most the last four characters.
///
/// Short values are fully masked so the reveal never exposes most of a key.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= MASK_REVEAL * 2 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - MASK_REVEAL..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - MASK_REVEAL), tail)
}
