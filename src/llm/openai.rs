//! OpenAI-compatible chat completions client.
//!
//! Works with Ollama's `/v1` endpoint and Gemini's OpenAI compatibility layer,
//! which are the two default profiles.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::sse::{SseDecoder, StreamEvent, parse_event};
use super::{ChatMessage, FragmentStream, ModelBackend, ModelProfile};
use crate::errors::ModelError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct OpenAiClient {
    client: Client,
    profile: ModelProfile,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

impl OpenAiClient {
    pub fn new(profile: ModelProfile) -> Result<Self, ModelError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(ModelError::Http)?;
        Ok(Self { client, profile })
    }

    pub fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.profile.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ModelBackend for OpenAiClient {
    fn describe(&self) -> String {
        format!("{} @ {}", self.profile.model, self.profile.base_url)
    }

    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<FragmentStream, ModelError> {
        let body = ChatRequest {
            model: &self.profile.model,
            messages,
            stream: true,
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.profile.api_key {
            request = request.bearer_auth(key);
        }

        debug!(endpoint = %self.endpoint(), model = %self.profile.model, messages = messages.len(), "starting chat stream");
        let response = request.send().await.map_err(ModelError::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }

        let stream = async_stream::stream! {
            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            let mut finished = false;

            while !finished {
                let events = match bytes.next().await {
                    Some(Ok(chunk)) => decoder.push(&chunk),
                    Some(Err(e)) => {
                        yield Err(ModelError::Stream(e.to_string()));
                        break;
                    }
                    None => {
                        finished = true;
                        decoder.finish()
                    }
                };

                for data in events {
                    match parse_event(&data) {
                        Ok(StreamEvent::Fragment(text)) => yield Ok(text),
                        Ok(StreamEvent::Skip) => {}
                        Ok(StreamEvent::Done) => {
                            finished = true;
                            break;
                        }
                        Err(e) => {
                            yield Err(e);
                            finished = true;
                            break;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str, api_key: Option<&str>) -> OpenAiClient {
        OpenAiClient::new(ModelProfile {
            base_url: base_url.to_string(),
            model: "llama3.2:3b".to_string(),
            api_key: api_key.map(str::to_string),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            client("https://generativelanguage.googleapis.com/v1beta/openai/", None).endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
        );
        assert_eq!(
            client("http://localhost:11434/v1", None).endpoint(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("rules"), ChatMessage::user("make a page")];
        let body = ChatRequest {
            model: "gemini-2.0-flash",
            messages: &messages,
            stream: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gemini-2.0-flash");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "make a page");
    }

    #[test]
    fn test_describe_names_model_and_endpoint() {
        assert_eq!(
            client("http://localhost:11434/v1", None).describe(),
            "llama3.2:3b @ http://localhost:11434/v1"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let backend = client("http://127.0.0.1:1/v1", None);
        let result = backend.stream_chat(&[ChatMessage::user("hi")]).await;
        assert!(matches!(result, Err(ModelError::Http(_))));
    }
}
