//! HTTP client for the agent chat API.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::retry::{retry_with_backoff, RetryPolicy};

/// Instruction prepended to every conversation so agents stay terse.
pub const SYSTEM_PROMPT: &str = "Please provide brief, focused responses. \
     Keep explanations under 3 sentences when possible.";

/// The four agent personas. Each maps to a route segment on the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Vocafi,
    Wooly,
    Clarity,
    Hwc,
}

impl Agent {
    pub const ALL: [Agent; 4] = [Agent::Vocafi, Agent::Wooly, Agent::Clarity, Agent::Hwc];

    /// The route segment: requests go to `{base}/{segment}/chat`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Agent::Vocafi => "vocafi",
            Agent::Wooly => "wooly",
            Agent::Clarity => "clarity",
            Agent::Hwc => "hwc",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Agent::Vocafi => "VocaFI",
            Agent::Wooly => "Wooly",
            Agent::Clarity => "Clarity",
            Agent::Hwc => "HWC",
        }
    }
}

impl FromStr for Agent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vocafi" => Ok(Agent::Vocafi),
            "wooly" => Ok(Agent::Wooly),
            "clarity" => Ok(Agent::Clarity),
            "hwc" => Ok(Agent::Hwc),
            other => Err(format!("unknown agent: {other}")),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("rate limited by the chat API")]
    RateLimited,

    #[error("chat API unavailable after repeated rate limits")]
    MaxRetriesExceeded,

    #[error("chat API returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl ChatError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ChatError::RateLimited)
    }
}

/// Client for the chat backend.
#[derive(Clone, Debug)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One chat turn: POST the conversation so far, get the agent's
    /// reply. `messages` should already include the system prompt.
    pub async fn chat(&self, agent: Agent, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let url = format!("{}/{}/chat", self.base_url, agent.as_str());
        let response = self
            .http
            .post(&url)
            .json(&ChatRequest { messages })
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ChatError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        Ok(body.response)
    }

    /// [`ChatClient::chat`] behind the standard backoff policy: rate
    /// limits are retried with doubling delays, every other error
    /// returns immediately.
    pub async fn chat_with_retry(
        &self,
        policy: RetryPolicy,
        agent: Agent,
        messages: &[ChatMessage],
    ) -> Result<String, ChatError> {
        retry_with_backoff(
            policy,
            || self.chat(agent, messages),
            ChatError::is_rate_limited,
            || ChatError::MaxRetriesExceeded,
        )
        .await
    }

    /// GET {base}/health; true when the backend answers 200.
    pub async fn health(&self) -> Result<bool, ChatError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

/// Start a conversation: the system prompt plus the user's first line.
pub fn conversation(first_message: impl Into<String>) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(first_message),
    ]
}
