//! Generation capability: the trait seam the session router talks to, and the
//! Gemini REST implementation behind it.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::UpstreamError;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// An ongoing multi-turn exchange owned by the provider.
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Send one user turn and return the generated reply.
    async fn send_message(&self, text: &str) -> Result<String, UpstreamError>;
}

/// Opaque handle stored by the session store.
pub type ConversationHandle = Arc<dyn Conversation>;

/// Factory for new conversations.
pub trait GenerationClient: Send + Sync {
    fn new_conversation(&self) -> ConversationHandle;
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    fn endpoint(&self) -> String {
        let model = self.model.strip_prefix("models/").unwrap_or(&self.model);
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    config: Arc<GeminiConfig>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, config: Arc::new(config) })
    }
}

impl GenerationClient for GeminiClient {
    fn new_conversation(&self) -> ConversationHandle {
        Arc::new(GeminiChat {
            http: self.http.clone(),
            config: Arc::clone(&self.config),
            history: Mutex::new(Vec::new()),
        })
    }
}

/// A chat session against `generateContent`. The full history is sent on
/// every turn; it only grows when a turn succeeds.
struct GeminiChat {
    http: Client,
    config: Arc<GeminiConfig>,
    history: Mutex<Vec<Content>>,
}

#[async_trait]
impl Conversation for GeminiChat {
    async fn send_message(&self, text: &str) -> Result<String, UpstreamError> {
        // Held across the call so turns on one conversation run in order.
        let mut history = self.history.lock().await;

        let user_turn = Content::text("user", text);
        let mut contents = history.clone();
        contents.push(user_turn.clone());

        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&GenerateContentRequest { contents })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let body: GenerateContentResponse = response.json().await?;
        let reply = extract_text(body)?;

        history.push(user_turn);
        history.push(Content::text("model", &reply));
        Ok(reply)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part { text: Some(text.to_string()) }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn extract_text(body: GenerateContentResponse) -> Result<String, UpstreamError> {
    if let Some(err) = body.error {
        return Err(UpstreamError::Api(err.message));
    }

    let text: String = body
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(UpstreamError::EmptyResponse);
    }
    Ok(text)
}
