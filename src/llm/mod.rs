//! Model invocation.
//!
//! A [`ModelBackend`] turns a message list into a finite stream of text
//! fragments. The stream cannot be restarted; a new request is a new call.
//!
//! - `openai`: OpenAI-compatible chat completions over HTTP with SSE streaming
//! - `scripted`: canned replies, for tests and offline runs
//! - `sse`: incremental server-sent-events decoder used by `openai`

pub mod openai;
pub mod scripted;
pub mod sse;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub use openai::OpenAiClient;
pub use scripted::ScriptedBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Text fragments in arrival order. Ends after the last fragment or the first error.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short description for logs, e.g. `llama3.2:3b @ http://localhost:11434/v1`.
    fn describe(&self) -> String;

    /// Start a streamed completion. Errors before the first fragment (connection
    /// refused, non-success status) are returned here; later ones arrive in the stream.
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<FragmentStream, ModelError>;
}

/// Endpoint, model id and credentials for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProfile {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// The local and remote backends a session switches between.
#[derive(Clone)]
pub struct ModelRouter {
    local: Arc<dyn ModelBackend>,
    remote: Arc<dyn ModelBackend>,
}

impl ModelRouter {
    pub fn new(local: Arc<dyn ModelBackend>, remote: Arc<dyn ModelBackend>) -> Self {
        Self { local, remote }
    }

    /// Use the same backend for both modes.
    pub fn single(backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            local: backend.clone(),
            remote: backend,
        }
    }

    pub fn select(&self, local_mode: bool) -> &dyn ModelBackend {
        if local_mode {
            self.local.as_ref()
        } else {
            self.remote.as_ref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_router_selects_by_mode() {
        let local = Arc::new(ScriptedBackend::named("local"));
        let remote = Arc::new(ScriptedBackend::named("remote"));
        let router = ModelRouter::new(local, remote);
        assert_eq!(router.select(true).describe(), "local");
        assert_eq!(router.select(false).describe(), "remote");
    }
}
