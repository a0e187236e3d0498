//! Wire form of bridge operations
//!
//! Requests are tagged by `op`; responses are `{"ok": value}` or
//! `{"error": {...}}`. Front ends that talk over a byte stream wrap them in
//! numbered frames and receive output events interleaved with responses.

use super::Bridge;
use crate::error::{Error, Result};
use crate::types::{AgentProfile, LaunchId, OutputEvent, SecretSet};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};

/// Version of the operation set below; bumped on incompatible changes
pub const BRIDGE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum BridgeRequest {
    Version,
    ListAgents,
    CreateAgent {
        name: String,
    },
    LoadAgentConfig {
        name: String,
    },
    SaveAgentConfig {
        name: String,
        config: AgentProfile,
    },
    LaunchAgents {
        command: String,
    },
    LaunchProfiles {
        profiles: Vec<String>,
    },
    CancelLaunch {
        #[serde(rename = "launchId")]
        launch_id: LaunchId,
    },
    GetApiKeys,
    SaveApiKeys {
        keys: SecretSet,
    },
    AgentAvailability,
    ListModels,
}

impl BridgeRequest {
    pub fn op(&self) -> &'static str {
        match self {
            BridgeRequest::Version => "version",
            BridgeRequest::ListAgents => "list-agents",
            BridgeRequest::CreateAgent { .. } => "create-agent",
            BridgeRequest::LoadAgentConfig { .. } => "load-agent-config",
            BridgeRequest::SaveAgentConfig { .. } => "save-agent-config",
            BridgeRequest::LaunchAgents { .. } => "launch-agents",
            BridgeRequest::LaunchProfiles { .. } => "launch-profiles",
            BridgeRequest::CancelLaunch { .. } => "cancel-launch",
            BridgeRequest::GetApiKeys => "get-api-keys",
            BridgeRequest::SaveApiKeys { .. } => "save-api-keys",
            BridgeRequest::AgentAvailability => "agent-availability",
            BridgeRequest::ListModels => "list-models",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl From<&Error> for BridgeErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            exit_code: err.exit_code(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BridgeResponse {
    Ok(Value),
    Error(BridgeErrorBody),
}

impl BridgeResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, BridgeResponse::Ok(_))
    }
}

impl From<Result<Value>> for BridgeResponse {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(value) => BridgeResponse::Ok(value),
            Err(e) => BridgeResponse::Error(BridgeErrorBody::from(&e)),
        }
    }
}

/// A numbered request arriving over a stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeFrame {
    pub id: u64,
    #[serde(flatten)]
    pub request: BridgeRequest,
}

/// Anything the backend writes back over a stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BridgeMessage {
    Hello { version: u32 },
    /// `id` is `null` when the request was too malformed to carry one
    Response {
        id: Option<u64>,
        response: BridgeResponse,
    },
    Output { event: OutputEvent },
}

impl Bridge {
    /// Execute one request and encode its result
    pub async fn dispatch(&self, request: BridgeRequest) -> BridgeResponse {
        let op = request.op();
        debug!("Bridge request: {}", op);

        let result = self.handle(request).await;
        if let Err(e) = &result {
            error!("Bridge request {} failed: {}", op, e);
        }
        result.into()
    }

    async fn handle(&self, request: BridgeRequest) -> Result<Value> {
        match request {
            BridgeRequest::Version => Ok(json!(BRIDGE_VERSION)),
            BridgeRequest::ListAgents => Ok(serde_json::to_value(self.list_agents().await?)?),
            BridgeRequest::CreateAgent { name } => {
                self.create_agent(&name).await?;
                Ok(json!(true))
            }
            BridgeRequest::LoadAgentConfig { name } => {
                Ok(serde_json::to_value(self.load_agent_config(&name).await?)?)
            }
            BridgeRequest::SaveAgentConfig { name, config } => {
                self.save_agent_config(&name, &config).await?;
                Ok(json!(true))
            }
            BridgeRequest::LaunchAgents { command } => {
                Ok(serde_json::to_value(self.launch_agents(&command).await?)?)
            }
            BridgeRequest::LaunchProfiles { profiles } => {
                Ok(serde_json::to_value(self.launch_profiles(&profiles).await?)?)
            }
            BridgeRequest::CancelLaunch { launch_id } => {
                self.cancel_launch(launch_id).await?;
                Ok(json!(true))
            }
            BridgeRequest::GetApiKeys => Ok(serde_json::to_value(self.get_api_keys().await)?),
            BridgeRequest::SaveApiKeys { keys } => Ok(json!(self.save_api_keys(&keys).await)),
            BridgeRequest::AgentAvailability => {
                Ok(serde_json::to_value(self.agent_availability().await?)?)
            }
            BridgeRequest::ListModels => Ok(serde_json::to_value(self.models())?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DockConfig;
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, Bridge) {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("andy.json"),
            r#"{"name": "andy", "model": "gpt-4o", "modes": {}}"#,
        )
        .unwrap();
        let config =
            DockConfig::from_root(dir.path()).with_secrets_path(dir.path().join("config.json"));
        (dir, Bridge::new(config))
    }

    #[test]
    fn test_request_wire_format() {
        let request: BridgeRequest =
            serde_json::from_str(r#"{"op": "create-agent", "name": "bob"}"#).unwrap();
        assert_eq!(
            request,
            BridgeRequest::CreateAgent {
                name: "bob".to_string()
            }
        );
        assert_eq!(request.op(), "create-agent");

        let frame: BridgeFrame = serde_json::from_str(r#"{"id": 4, "op": "list-agents"}"#).unwrap();
        assert_eq!(frame.id, 4);
        assert_eq!(frame.request, BridgeRequest::ListAgents);
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        assert!(serde_json::from_str::<BridgeRequest>(r#"{"op": "delete-agent"}"#).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let ok = BridgeResponse::Ok(json!(true));
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"ok": true}));

        let err = BridgeResponse::from(Err::<Value, _>(Error::Launch(
            crate::error::LaunchError::ProcessFailed { code: Some(2) },
        )));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"error": {
                "kind": "process_failed",
                "message": "Launch error: Process exited with code 2",
                "exitCode": 2
            }})
        );
    }

    #[tokio::test]
    async fn test_dispatch_profile_operations() {
        let (_dir, bridge) = setup();

        let created = bridge
            .dispatch(BridgeRequest::CreateAgent {
                name: "bob".to_string(),
            })
            .await;
        assert_eq!(created, BridgeResponse::Ok(json!(true)));

        let listed = bridge.dispatch(BridgeRequest::ListAgents).await;
        assert_eq!(listed, BridgeResponse::Ok(json!(["bob"])));

        let loaded = bridge
            .dispatch(BridgeRequest::LoadAgentConfig {
                name: "bob".to_string(),
            })
            .await;
        match loaded {
            BridgeResponse::Ok(value) => assert_eq!(value["model"], json!("gpt-4o")),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_reports_not_found() {
        let (_dir, bridge) = setup();
        let response = bridge
            .dispatch(BridgeRequest::LoadAgentConfig {
                name: "ghost".to_string(),
            })
            .await;

        match response {
            BridgeResponse::Error(body) => assert_eq!(body.kind, "not_found"),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_api_keys() {
        let (_dir, bridge) = setup();

        let mut keys = SecretSet::new();
        keys.insert("GEMINI_API_KEY", "g-key");
        let saved = bridge
            .dispatch(BridgeRequest::SaveApiKeys { keys: keys.clone() })
            .await;
        assert_eq!(saved, BridgeResponse::Ok(json!(true)));

        let loaded = bridge.dispatch(BridgeRequest::GetApiKeys).await;
        assert_eq!(loaded, BridgeResponse::Ok(json!({"GEMINI_API_KEY": "g-key"})));
    }

    #[tokio::test]
    async fn test_dispatch_version_and_models() {
        let (_dir, bridge) = setup();
        assert_eq!(
            bridge.dispatch(BridgeRequest::Version).await,
            BridgeResponse::Ok(json!(BRIDGE_VERSION))
        );
        match bridge.dispatch(BridgeRequest::ListModels).await {
            BridgeResponse::Ok(Value::Array(models)) => assert!(!models.is_empty()),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dispatch_launch_failure() {
        let (_dir, bridge) = setup();
        let response = bridge
            .dispatch(BridgeRequest::LaunchAgents {
                command: "exit 5".to_string(),
            })
            .await;

        match response {
            BridgeResponse::Error(body) => {
                assert_eq!(body.kind, "process_failed");
                assert_eq!(body.exit_code, Some(5));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
