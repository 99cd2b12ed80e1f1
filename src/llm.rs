//! Code-generation backends - OpenAI-compatible HTTP (default) or disabled

use crate::config::LlmConfig;
use crate::error::{CommandError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Chat message sent to the backend
#[derive(Clone, Debug)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Copy, Debug)]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
        }
    }
}

/// Trait for code-generation backends
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generate a full (non-streamed) reply for a system/user prompt pair
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Backend used when no LLM is configured
pub struct DisabledGenerator;

#[async_trait]
impl CodeGenerator for DisabledGenerator {
    async fn generate(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        Err(CommandError::Generation(
            "code generation is not configured".into(),
        ))
    }
}

/// Create the configured backend
pub fn create_backend(config: &LlmConfig) -> anyhow::Result<Arc<dyn CodeGenerator>> {
    match config {
        LlmConfig::Disabled => Ok(Arc::new(DisabledGenerator)),
        #[cfg(feature = "openai-compat")]
        LlmConfig::OpenAiCompat {
            base_url,
            model,
            api_key,
            temperature,
            max_tokens,
            ..
        } => Ok(Arc::new(openai_compat::OpenAiCompatBackend::new(
            base_url.clone(),
            model.clone(),
            api_key.clone(),
            *temperature,
            *max_tokens,
        )?)),
        #[cfg(not(feature = "openai-compat"))]
        LlmConfig::OpenAiCompat { .. } => Err(anyhow::anyhow!(
            "OpenAI-compatible backend not enabled. Build with --features openai-compat"
        )),
    }
}

// ============================================================================
// OpenAI-compatible backend
// ============================================================================

#[cfg(feature = "openai-compat")]
pub mod openai_compat {
    use super::*;
    use serde_json::{json, Value};
    use std::time::Duration;

    pub struct OpenAiCompatBackend {
        client: reqwest::Client,
        base_url: String,
        model: String,
        api_key: Option<String>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    }

    impl OpenAiCompatBackend {
        pub fn new(
            base_url: String,
            model: String,
            api_key: Option<String>,
            temperature: Option<f32>,
            max_tokens: Option<u32>,
        ) -> anyhow::Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?;
            Ok(Self {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                model,
                api_key: api_key.filter(|k| !k.is_empty()),
                temperature,
                max_tokens,
            })
        }

        fn request_body(&self, messages: &[Message]) -> Value {
            let messages: Vec<Value> = messages
                .iter()
                .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
                .collect();

            let mut body = json!({
                "model": self.model,
                "messages": messages,
                "stream": false,
            });
            if let Some(t) = self.temperature {
                body["temperature"] = json!(t);
            }
            if let Some(n) = self.max_tokens {
                body["max_tokens"] = json!(n);
            }
            body
        }
    }

    #[async_trait]
    impl CodeGenerator for OpenAiCompatBackend {
        async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
            let messages = [Message::system(system_prompt), Message::user(user_prompt)];
            let url = format!("{}/chat/completions", self.base_url);

            let mut request = self.client.post(&url).json(&self.request_body(&messages));
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request
                .send()
                .await
                .map_err(|e| CommandError::Generation(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                return Err(CommandError::Generation(format!("{}: {}", status, detail.trim())));
            }

            let json: Value = response
                .json()
                .await
                .map_err(|e| CommandError::Generation(e.to_string()))?;
            let text = json["choices"][0]["message"]["content"]
                .as_str()
                .unwrap_or("")
                .trim()
                .to_string();

            if text.is_empty() {
                return Err(CommandError::Generation("LLM returned empty response".into()));
            }
            Ok(text)
        }
    }

}
