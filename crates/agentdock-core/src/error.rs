//! Error types for AgentDock Core

use thiserror::Error;

/// Main error type for AgentDock operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("Launch error: {0}")]
    Launch(#[from] LaunchError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Agent profile errors
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Malformed profile {name}: {reason}")]
    Malformed { name: String, reason: String },

    #[error("Invalid profile name: {0:?}")]
    InvalidName(String),

    #[error("Template unreadable at {path}: {reason}")]
    TemplateUnreadable { path: String, reason: String },
}

/// Secret store errors
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Failed to write secrets to {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Unknown secret name: {0}")]
    UnknownSecret(String),
}

/// Process launch errors
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("No profiles selected")]
    NoSelection,

    #[error("Failed to spawn process: {0}")]
    SpawnFailed(String),

    #[error("Process exited with code {}", .code.map(|c| c.to_string()).unwrap_or_else(|| "none (terminated by signal)".to_string()))]
    ProcessFailed { code: Option<i32> },

    #[error("Launch not found: {0}")]
    UnknownLaunch(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown mode {mode} for profile {profile}")]
    UnknownMode { profile: String, mode: String },
}

impl Error {
    /// Stable, machine-readable error category used in bridge responses
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Profile(ProfileError::NotFound(_)) => "not_found",
            Error::Profile(ProfileError::Malformed { .. }) => "malformed",
            Error::Profile(ProfileError::InvalidName(_)) => "invalid_name",
            Error::Profile(ProfileError::TemplateUnreadable { .. }) => "template_unreadable",
            Error::Secret(SecretError::WriteFailed { .. }) => "io",
            Error::Secret(SecretError::UnknownSecret(_)) => "unknown_secret",
            Error::Launch(LaunchError::NoSelection) => "no_selection",
            Error::Launch(LaunchError::SpawnFailed(_)) => "spawn_failed",
            Error::Launch(LaunchError::ProcessFailed { .. }) => "process_failed",
            Error::Launch(LaunchError::UnknownLaunch(_)) => "unknown_launch",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "malformed",
            Error::Internal(_) => "internal",
        }
    }

    /// Exit code carried by a failed launch, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::Launch(LaunchError::ProcessFailed { code }) => *code,
            _ => None,
        }
    }
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
