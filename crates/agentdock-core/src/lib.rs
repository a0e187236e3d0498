//! AgentDock Core Library
//!
//! Backend for the AgentDock launcher:
//! - Agent profile files (list, create from template, read, write)
//! - API key storage and masking
//! - Launching the automation process with secrets injected and output streamed
//! - The bridge that front ends use to reach all of the above
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     agentdock-core                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  bridge/       - Typed API, wire protocol, subscriptions    │
//! │  launcher/     - Child process spawn and output streaming   │
//! │  store/        - Profile and secret JSON files              │
//! │  types/        - Profiles, secrets, models, launch events   │
//! │  config.rs     - Installation paths and launch settings     │
//! │  error.rs      - Error types                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod launcher;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;

pub use bridge::{
    Bridge, BridgeErrorBody, BridgeFrame, BridgeMessage, BridgeRequest, BridgeResponse,
    Subscription, BRIDGE_VERSION,
};
pub use config::DockConfig;
pub use launcher::{LaunchCanceller, LaunchHandle, OutputHub, ProcessLauncher};
pub use store::{ProfileStore, SecretSource, SecretStore};
