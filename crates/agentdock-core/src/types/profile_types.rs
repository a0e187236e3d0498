//! Agent profile types

use crate::error::{ConfigError, Error, ProfileError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Speaker of a single message inside an example transcript
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One message inside an example transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExampleMessage {
    pub role: Role,
    pub content: String,
}

impl ExampleMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// An example transcript: an ordered sequence of messages
pub type Example = Vec<ExampleMessage>;

/// Agent profile as stored in `<profiles_dir>/<name>.json`
///
/// Keys the editor does not model are kept in `extra` so a full-document
/// save writes them back untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentProfile {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub conversing: String,
    #[serde(default)]
    pub coding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saving_memory: Option<String>,
    #[serde(default)]
    pub modes: BTreeMap<String, bool>,
    #[serde(default)]
    pub conversation_examples: Vec<Example>,
    #[serde(default)]
    pub coding_examples: Vec<Example>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            conversing: String::new(),
            coding: String::new(),
            saving_memory: None,
            modes: BTreeMap::new(),
            conversation_examples: Vec::new(),
            coding_examples: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Names of the modes currently enabled
    pub fn enabled_modes(&self) -> Vec<&str> {
        self.modes
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(mode, _)| mode.as_str())
            .collect()
    }

    /// Enable or disable an existing mode.
    ///
    /// The mode set is fixed by the template; unknown modes are rejected
    /// rather than added.
    pub fn set_mode(&mut self, mode: &str, enabled: bool) -> Result<()> {
        match self.modes.get_mut(mode) {
            Some(flag) => {
                *flag = enabled;
                Ok(())
            }
            None => Err(Error::Config(ConfigError::UnknownMode {
                profile: self.name.clone(),
                mode: mode.to_string(),
            })),
        }
    }
}

/// Check that a profile name is usable as a single file stem
pub fn validate_profile_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.trim() != name;

    if invalid {
        return Err(Error::Profile(ProfileError::InvalidName(name.to_string())));
    }
    Ok(())
}
