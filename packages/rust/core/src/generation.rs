//! Text generation backends.
//!
//! The answerer only sees [`Generator`]; [`OllamaGenerator`] talks to a local
//! Ollama server over its chat endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use siteqa_shared::{GenerationConfig, Result, SiteQaError};

/// System message sent with every chat request.
pub const SYSTEM_PROMPT: &str = "คุณคือผู้ช่วยภาษาไทยสำหรับตอบคำถามจากเนื้อหาเว็บไซต์";

/// Produces a reply for a fully composed prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

/// Non-streaming client for Ollama's `/api/chat`.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SiteQaError::generation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_chat(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    #[instrument(skip_all, fields(model = %model, prompt_chars = prompt.chars().count()))]
    async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        let req = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
        };

        let resp = self
            .client
            .post(self.endpoint_chat())
            .json(&req)
            .send()
            .await
            .map_err(|e| SiteQaError::generation(format!("ollama request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SiteQaError::generation(format!("ollama chat HTTP {status}")));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| SiteQaError::generation(format!("invalid ollama response: {e}")))?;

        let reply = parsed.message.content.trim().to_string();
        debug!(reply_chars = reply.chars().count(), "generation completed");
        Ok(reply)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}
