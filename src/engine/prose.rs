//! The external prose-generation capability.
//!
//! The renderer only depends on [`ProseGenerator`]; any implementation
//! satisfying it works. Two are provided: [`GeminiProse`] calls a
//! Gemini-compatible HTTP API and [`OfflineProse`] always declines, so every
//! requirement is rendered through the fallback sentence.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ProseConfig, Requirement, RequirementId, ServiceFailure};

/// The shape every generated sentence must follow.
pub const SENTENCE_TEMPLATE: &str = "The system shall [action] when [condition] to [outcome].";

/// A failure of the prose service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No response arrived in time.
    #[error("request timed out")]
    Timeout,

    /// The response could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The service could not be reached or refused the request.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// The failure kind reported in diagnostics, without the message.
    #[must_use]
    pub const fn failure(&self) -> ServiceFailure {
        match self {
            Self::Timeout => ServiceFailure::Timeout,
            Self::Malformed(_) => ServiceFailure::Malformed,
            Self::Unavailable(_) => ServiceFailure::Unavailable,
        }
    }
}

/// The structured prompt sent for one requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredPrompt {
    /// The requirement being rendered.
    pub id: RequirementId,
    /// Section heading of the requirement.
    pub category: &'static str,
    /// When the requirement applies.
    pub condition: String,
    /// What the system does.
    pub action: String,
    /// The business result.
    pub outcome: String,
    /// The documented rule or failure the requirement traces to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Requirements this one depends on.
    pub related_ids: Vec<RequirementId>,
}

impl From<&Requirement> for StructuredPrompt {
    fn from(requirement: &Requirement) -> Self {
        let statement = requirement.statement();
        Self {
            id: requirement.id(),
            category: statement.category.label(),
            condition: statement.condition.clone(),
            action: statement.action.clone(),
            outcome: statement.outcome.clone(),
            rationale: statement.rationale.clone(),
            related_ids: requirement.related_ids().iter().copied().collect(),
        }
    }
}

impl StructuredPrompt {
    /// Renders the full instruction text sent to a language model.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Malformed`] if the prompt cannot be encoded.
    pub fn to_text(&self) -> Result<String, ServiceError> {
        let fields = serde_json::to_string_pretty(self)
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        Ok(format!(
            "You are writing one functional requirement for a Software Requirements \
             Specification read by business stakeholders.\n\
             Write exactly one sentence in plain business language using the template:\n\
             {SENTENCE_TEMPLATE}\n\
             Use the structured fields below. Keep the meaning of the condition, action and \
             outcome, avoid technical jargon, and do not mention the requirement ID.\n\n\
             {fields}\n"
        ))
    }
}

/// Generates business prose from a structured prompt.
#[async_trait]
pub trait ProseGenerator: Send + Sync {
    /// Returns the generated sentence.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] on timeout or a malformed response.
    async fn generate(&self, prompt: &StructuredPrompt) -> Result<String, ServiceError>;
}

/// A generator that never produces prose.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProse;

#[async_trait]
impl ProseGenerator for OfflineProse {
    async fn generate(&self, _prompt: &StructuredPrompt) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable("offline mode".to_string()))
    }
}

/// A client for the Gemini `generateContent` API.
#[derive(Debug, Clone)]
pub struct GeminiProse {
    client: Client,
    config: ProseConfig,
    api_key: String,
}

impl GeminiProse {
    /// Creates a client, reading the API key from the environment variable
    /// named in the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unavailable`] if the key is not set or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &ProseConfig) -> Result<Self, ServiceError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            ServiceError::Unavailable(format!("{} is not set", config.api_key_env))
        })?;
        Self::new(config.clone(), api_key)
    }

    /// Creates a client with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unavailable`] if the HTTP client cannot be
    /// built.
    pub fn new(config: ProseConfig, api_key: String) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.timeout() + Duration::from_secs(5))
            .build()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

impl GeminiResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect();
        Some(text)
    }
}

#[async_trait]
impl ProseGenerator for GeminiProse {
    async fn generate(&self, prompt: &StructuredPrompt) -> Result<String, ServiceError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_text()?,
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );

        debug!(requirement = %prompt.id, model = %self.config.model, "calling prose service");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Timeout
                } else {
                    ServiceError::Unavailable(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Unavailable(format!("HTTP {status}")));
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| ServiceError::Malformed(e.without_url().to_string()))?
            .into_text()
            .ok_or_else(|| ServiceError::Malformed("response has no candidates".to_string()))
    }
}
