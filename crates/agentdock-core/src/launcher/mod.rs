//! Automation process launcher
//!
//! This module handles:
//! - Spawning the automation entrypoint through the platform shell
//! - Injecting stored secrets into the child environment
//! - Forwarding stdout/stderr chunks as output events
//! - Exit-code based completion and optional cancellation

mod hub;
mod process;
mod stream;

pub use hub::OutputHub;
pub use process::{LaunchCanceller, LaunchHandle, ProcessLauncher};
