//! Bridge between the presentation plane and the backend
//!
//! The only way a front end reaches the profile store, the secret store and
//! the launcher. Calls are async request/response; launch output is pushed
//! through [`Subscription`]s that can attach and detach at any time.

mod protocol;

pub use protocol::{
    BridgeErrorBody, BridgeFrame, BridgeMessage, BridgeRequest, BridgeResponse, BRIDGE_VERSION,
};

use crate::config::DockConfig;
use crate::error::{Error, LaunchError, ProfileError, Result};
use crate::launcher::{LaunchCanceller, LaunchHandle, OutputHub, ProcessLauncher};
use crate::store::{ProfileStore, SecretSource, SecretStore};
use crate::types::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Backend facade shared by every front end
pub struct Bridge {
    config: DockConfig,
    profiles: ProfileStore,
    secrets: Arc<SecretStore>,
    launcher: ProcessLauncher,
    /// In-flight launches started through `launch_agents`
    launches: Mutex<HashMap<LaunchId, LaunchCanceller>>,
}

impl Bridge {
    pub fn new(config: DockConfig) -> Self {
        let secrets = Arc::new(SecretStore::new(&config.secrets_path));
        let source: Arc<dyn SecretSource> = secrets.clone();
        let launcher = ProcessLauncher::new(&config.automation_root, source, OutputHub::new());

        info!(
            "Bridge v{} ready (profiles: {:?}, secrets: {:?})",
            BRIDGE_VERSION, config.profiles_dir, config.secrets_path
        );

        Self {
            profiles: ProfileStore::from_config(&config),
            config,
            secrets,
            launcher,
            launches: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &DockConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    pub async fn list_agents(&self) -> Result<Vec<String>> {
        self.profiles.list().await
    }

    pub async fn create_agent(&self, name: &str) -> Result<()> {
        self.profiles.create(name).await
    }

    pub async fn load_agent_config(&self, name: &str) -> Result<AgentProfile> {
        self.profiles.read(name).await
    }

    pub async fn save_agent_config(&self, name: &str, profile: &AgentProfile) -> Result<()> {
        self.profiles.write(name, profile).await
    }

    /// Profile name -> launchable.
    ///
    /// A profile is unavailable when its catalog model needs a key that is
    /// not set, or when it cannot be read.
    pub async fn agent_availability(&self) -> Result<BTreeMap<String, bool>> {
        let names = self.profiles.list().await?;
        let secrets = self.secrets.get().await;

        let mut availability = BTreeMap::new();
        for name in names {
            let available = match self.profiles.read(&name).await {
                Ok(profile) => match find_model(&profile.model).and_then(|m| m.key) {
                    Some(key) => secrets.is_available(key),
                    None => true,
                },
                Err(e) => {
                    warn!("Profile {} unavailable: {}", name, e);
                    false
                }
            };
            availability.insert(name, available);
        }
        Ok(availability)
    }

    pub fn models(&self) -> &'static [ModelOption] {
        MODEL_CATALOG
    }

    // ------------------------------------------------------------------
    // Secrets
    // ------------------------------------------------------------------

    pub async fn get_api_keys(&self) -> SecretSet {
        self.secrets.get().await
    }

    /// Persist the full key set. Failures are logged and reported as `false`.
    pub async fn save_api_keys(&self, keys: &SecretSet) -> bool {
        match self.secrets.put(keys).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save API keys: {}", e);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Launching
    // ------------------------------------------------------------------

    /// Spawn `command` and hand back the handle. The bridge does not track it.
    pub async fn start_launch(&self, command: &str) -> Result<LaunchHandle> {
        self.launcher.launch(command).await
    }

    /// Run `command` to completion; cancellable through `cancel_launch`
    pub async fn launch_agents(&self, command: &str) -> Result<LaunchOutcome> {
        let handle = self.launcher.launch(command).await?;
        let id = handle.id();
        self.launches.lock().await.insert(id, handle.canceller());

        let result = handle.wait().await;

        self.launches.lock().await.remove(&id);
        result
    }

    /// Build the entrypoint command for `profiles` and run it
    pub async fn launch_profiles(&self, profiles: &[String]) -> Result<LaunchOutcome> {
        let command = self.launch_command(profiles).await?;
        self.launch_agents(&command).await
    }

    /// Command line that launches `profiles`.
    ///
    /// Fails with `NoSelection` for an empty selection and `NotFound` for a
    /// profile without a file.
    pub async fn launch_command(&self, profiles: &[String]) -> Result<String> {
        let request = LaunchRequest::new(profiles.iter().cloned());
        let command = request.to_command(&self.config)?;
        for name in request.profiles() {
            if !self.profiles.exists(name).await? {
                return Err(Error::Profile(ProfileError::NotFound(name.clone())));
            }
        }
        Ok(command)
    }

    /// Request termination of an in-flight launch
    pub async fn cancel_launch(&self, id: LaunchId) -> Result<()> {
        let launches = self.launches.lock().await;
        let canceller = launches
            .get(&id)
            .ok_or_else(|| Error::Launch(LaunchError::UnknownLaunch(id.to_string())))?;
        info!("Cancelling launch {}", id);
        canceller.cancel();
        Ok(())
    }

    pub async fn active_launches(&self) -> Vec<LaunchId> {
        self.launches.lock().await.keys().copied().collect()
    }

    // ------------------------------------------------------------------
    // Output events
    // ------------------------------------------------------------------

    /// Attach to launch output. Events sent before attaching are not replayed.
    pub fn subscribe_output(&self) -> Subscription {
        Subscription {
            rx: self.launcher.subscribe(),
        }
    }
}

/// A live attachment to launch output.
///
/// Events queue up until read; a slow subscriber never misses any.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<OutputEvent>,
}

impl Subscription {
    /// Next event; `None` once the bridge and its launches are gone
    pub async fn recv(&mut self) -> Option<OutputEvent> {
        self.rx.recv().await
    }

    /// Next already-delivered event, without waiting
    pub fn try_recv(&mut self) -> Option<OutputEvent> {
        self.rx.try_recv().ok()
    }

    /// Detach. Running launches are unaffected.
    pub fn unsubscribe(self) {
        debug!("Output subscriber detached");
    }
}
