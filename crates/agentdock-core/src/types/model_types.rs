//! Static model catalog

use serde::Serialize;

/// A model a profile may select
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ModelOption {
    /// Identifier written to the profile's `model` field
    pub value: &'static str,
    pub label: &'static str,
    /// Secret the model needs at launch, if any
    pub key: Option<&'static str>,
}

pub const MODEL_CATALOG: &[ModelOption] = &[
    ModelOption {
        value: "gpt-4o",
        label: "GPT-4o",
        key: Some("OPENAI_API_KEY"),
    },
    ModelOption {
        value: "gpt-4o-mini",
        label: "GPT-4o mini",
        key: Some("OPENAI_API_KEY"),
    },
    ModelOption {
        value: "gpt-4-turbo",
        label: "GPT-4 Turbo",
        key: Some("OPENAI_API_KEY"),
    },
    ModelOption {
        value: "gemini-1.5-pro",
        label: "Gemini 1.5 Pro",
        key: Some("GEMINI_API_KEY"),
    },
    ModelOption {
        value: "gemini-1.5-flash",
        label: "Gemini 1.5 Flash",
        key: Some("GEMINI_API_KEY"),
    },
    ModelOption {
        value: "claude-3-5-sonnet-20240620",
        label: "Claude 3.5 Sonnet",
        key: Some("ANTHROPIC_API_KEY"),
    },
    ModelOption {
        value: "claude-3-haiku-20240307",
        label: "Claude 3 Haiku",
        key: Some("ANTHROPIC_API_KEY"),
    },
    ModelOption {
        value: "replicate/meta/meta-llama-3-70b-instruct",
        label: "Llama 3 70B (Replicate)",
        key: Some("REPLICATE_API_KEY"),
    },
    ModelOption {
        value: "ollama/llama3",
        label: "Llama 3 (Ollama, local)",
        key: None,
    },
];

pub fn find_model(value: &str) -> Option<&'static ModelOption> {
    MODEL_CATALOG.iter().find(|option| option.value == value)
}
