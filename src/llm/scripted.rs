//! Backend that replays canned replies instead of calling a model.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatMessage, FragmentStream, ModelBackend};
use crate::errors::ModelError;

#[derive(Debug, Clone)]
enum Reply {
    Fragments(Vec<String>),
    /// Emit the fragments, then fail mid-stream.
    Interrupted(Vec<String>, String),
    /// Fail before streaming, like a non-success HTTP status.
    Rejected { status: u16, body: String },
}

#[derive(Debug, Default)]
struct State {
    replies: VecDeque<Reply>,
    requests: Vec<Vec<ChatMessage>>,
}

/// Replies are consumed in order, one per `stream_chat` call.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    name: String,
    state: Mutex<State>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::named("scripted")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::default(),
        }
    }

    /// Queue a reply streamed in small fragments.
    pub fn reply(self, text: &str) -> Self {
        let fragments = chunk(text, 16);
        self.push(Reply::Fragments(fragments))
    }

    pub fn interrupt_after(self, fragments: &[&str], message: &str) -> Self {
        self.push(Reply::Interrupted(
            fragments.iter().map(|s| s.to_string()).collect(),
            message.to_string(),
        ))
    }

    pub fn reject(self, status: u16, body: &str) -> Self {
        self.push(Reply::Rejected {
            status,
            body: body.to_string(),
        })
    }

    /// Message lists received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.lock().requests.clone()
    }

    fn push(self, reply: Reply) -> Self {
        self.lock().replies.push_back(reply);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn chunk(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|c| c.iter().collect::<String>())
        .collect()
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<FragmentStream, ModelError> {
        let reply = {
            let mut state = self.lock();
            state.requests.push(messages.to_vec());
            state.replies.pop_front()
        };

        let items: Vec<Result<String, ModelError>> = match reply {
            Some(Reply::Fragments(fragments)) => fragments.into_iter().map(Ok).collect(),
            Some(Reply::Interrupted(fragments, message)) => fragments
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(ModelError::Stream(message))))
                .collect(),
            Some(Reply::Rejected { status, body }) => {
                return Err(ModelError::Status { status, body });
            }
            None => {
                return Err(ModelError::Stream(format!(
                    "{} has no scripted reply left",
                    self.name
                )));
            }
        };

        Ok(Box::pin(futures::stream::iter(items)))
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_and_records_requests() {
        let backend = ScriptedBackend::new().reply("first").reply("second");

        let collected: Vec<_> = backend
            .stream_chat(&[ChatMessage::user("a")])
            .await
            .unwrap()
            .collect()
            .await;
        let text: String = collected.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(text, "first");

        let mut stream = backend.stream_chat(&[ChatMessage::user("b")]).await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "second");

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1][0].content, "b");
    }

    #[tokio::test]
    async fn test_long_reply_is_fragmented() {
        let text = "x".repeat(40);
        let backend = ScriptedBackend::new().reply(&text);
        let fragments: Vec<_> = backend
            .stream_chat(&[])
            .await
            .unwrap()
            .collect::<Vec<_>>()
            .await;
        assert_eq!(fragments.len(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let backend = ScriptedBackend::new();
        assert!(backend.stream_chat(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_reply() {
        let backend = ScriptedBackend::new().reject(401, "bad key");
        match backend.stream_chat(&[]).await {
            Err(ModelError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            _ => panic!("Expected Status error"),
        }
    }
}
