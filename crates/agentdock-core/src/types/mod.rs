//! Core type definitions for AgentDock
//!
//! Agent profiles, secrets, the model catalog and launch/output types shared
//! by the stores, the launcher and the bridge.

mod launch_types;
mod model_types;
mod profile_types;
mod secret_types;

pub use launch_types::*;
pub use model_types::*;
pub use profile_types::*;
pub use secret_types::*;
