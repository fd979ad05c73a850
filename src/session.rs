//! Per-user session state.
//!
//! A session owns the conversation log, the selected artifact spec, the
//! local-model toggle, the live materialized artifact and the handle of the
//! container it started. Nothing here is shared between sessions.

use std::path::Path;

use tracing::{info, warn};

use crate::catalog::{ArtifactKind, ArtifactSpec};
use crate::errors::SessionError;
use crate::lifecycle::{LifecycleManager, RunningContainer};
use crate::llm::{ChatMessage, Role};
use crate::materialize::MaterializedArtifact;
use crate::runtime::StopOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Alternating user/assistant log. Appended one exchange at a time.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::User,
            content: user.into(),
        });
        self.turns.push(Turn {
            role: Role::Assistant,
            content: assistant.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// The log as chat messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = ChatMessage> + '_ {
        self.turns.iter().map(|turn| ChatMessage {
            role: turn.role,
            content: turn.content.clone(),
        })
    }
}

/// What `Session::reset` did.
#[derive(Debug, Default)]
pub struct ResetReport {
    /// Outcome of stopping the tracked container; `None` if nothing was tracked.
    pub stopped: Option<StopOutcome>,
    pub removed_artifact: bool,
    pub warnings: Vec<String>,
}

pub struct Session {
    spec: ArtifactSpec,
    selector_locked: bool,
    local_mode: bool,
    conversation: Conversation,
    artifact: Option<MaterializedArtifact>,
    container: Option<RunningContainer>,
}

impl Session {
    pub fn new(spec: ArtifactSpec, local_mode: bool) -> Self {
        Self {
            spec,
            selector_locked: false,
            local_mode,
            conversation: Conversation::default(),
            artifact: None,
            container: None,
        }
    }

    pub fn spec(&self) -> &ArtifactSpec {
        &self.spec
    }

    pub fn kind(&self) -> ArtifactKind {
        self.spec.kind
    }

    /// Switch artifact kind. Only allowed before the first prompt or after a reset.
    pub fn select_kind(&mut self, spec: ArtifactSpec) -> Result<(), SessionError> {
        if self.selector_locked {
            return Err(SessionError::SelectorLocked {
                current: self.spec.kind,
            });
        }
        self.spec = spec;
        Ok(())
    }

    pub fn lock_selector(&mut self) {
        self.selector_locked = true;
    }

    pub fn selector_locked(&self) -> bool {
        self.selector_locked
    }

    pub fn local_mode(&self) -> bool {
        self.local_mode
    }

    pub fn set_local_mode(&mut self, local: bool) {
        self.local_mode = local;
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// System prompt, prior turns, then `prompt`.
    pub fn history(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.conversation.len() + 2);
        messages.push(ChatMessage::system(self.spec.system_prompt.clone()));
        messages.extend(self.conversation.messages());
        messages.push(ChatMessage::user(prompt));
        messages
    }

    pub fn artifact(&self) -> Option<&MaterializedArtifact> {
        self.artifact.as_ref()
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact.as_ref().map(MaterializedArtifact::path)
    }

    pub fn container(&self) -> Option<&RunningContainer> {
        self.container.as_ref()
    }

    pub(crate) fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.conversation.record_exchange(user, assistant);
    }

    /// Install a new artifact, removing the previous one's directory.
    pub(crate) fn replace_artifact(&mut self, artifact: MaterializedArtifact) {
        if let Some(old) = self.artifact.replace(artifact) {
            discard_logged(old);
        }
    }

    pub(crate) fn set_container(&mut self, container: Option<RunningContainer>) {
        self.container = container;
    }

    /// Give up ownership of the artifact so its directory outlives the session.
    pub fn take_artifact(&mut self) -> Option<MaterializedArtifact> {
        self.artifact.take()
    }

    /// Stop the session's container, drop its history and artifact, and unlock
    /// the kind selector.
    ///
    /// The logical container name is stopped even when no handle is tracked,
    /// so a container left over from an earlier failed turn is cleaned up too.
    pub async fn reset(&mut self, lifecycle: &LifecycleManager) -> ResetReport {
        let mut report = ResetReport::default();

        if self.spec.launch.is_some() {
            let name = self.spec.container_name();
            match lifecycle.stop(&name).await {
                Ok(outcome) => {
                    if self.container.is_some() || outcome == StopOutcome::Removed {
                        report.stopped = Some(outcome);
                    }
                }
                Err(e) => {
                    warn!(container = %name, error = %e, "reset could not stop container");
                    report.warnings.push(e.to_string());
                }
            }
        }
        self.container = None;

        if let Some(artifact) = self.artifact.take() {
            let dir = artifact.dir().to_path_buf();
            match artifact.discard() {
                Ok(()) => report.removed_artifact = true,
                Err(e) => report
                    .warnings
                    .push(format!("Failed to remove {}: {}", dir.display(), e)),
            }
        }

        self.conversation.clear();
        self.selector_locked = false;
        info!(kind = %self.spec.kind, "session reset");
        report
    }

    /// Packed working directory of the session's container.
    pub async fn download(&self, lifecycle: &LifecycleManager) -> Result<Vec<u8>, SessionError> {
        let container = self.container.as_ref().ok_or(SessionError::NoContainer)?;
        lifecycle
            .archive(&container.id)
            .await
            .map_err(SessionError::from)
    }
}

fn discard_logged(artifact: MaterializedArtifact) {
    let dir = artifact.dir().to_path_buf();
    if let Err(e) = artifact.discard() {
        warn!(dir = %dir.display(), error = %e, "failed to remove previous artifact");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::{Catalog, DEFAULT_CONTAINER_WORKDIR};
    use crate::materialize::Materializer;
    use crate::runtime::InMemoryRuntime;

    fn session(kind: ArtifactKind) -> Session {
        Session::new(Catalog::default().spec(kind), false)
    }

    #[test]
    fn test_select_kind_until_locked() {
        let catalog = Catalog::default();
        let mut session = session(ArtifactKind::Streamlit);

        session.select_kind(catalog.spec(ArtifactKind::Vue)).unwrap();
        assert_eq!(session.kind(), ArtifactKind::Vue);

        session.lock_selector();
        let err = session
            .select_kind(catalog.spec(ArtifactKind::Svg))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::SelectorLocked {
                current: ArtifactKind::Vue
            }
        ));
        assert_eq!(session.kind(), ArtifactKind::Vue);
    }

    #[test]
    fn test_history_wraps_conversation() {
        let mut session = session(ArtifactKind::Static);
        session.record_exchange("make a page", "```html\n<p/>\n```");

        let history = session.history("make it blue");
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[0].content, session.spec().system_prompt);
        assert_eq!(history[1], ChatMessage::user("make a page"));
        assert_eq!(history[2].role, Role::Assistant);
        assert_eq!(history[3], ChatMessage::user("make it blue"));
    }

    #[test]
    fn test_conversation_alternates() {
        let mut conversation = Conversation::default();
        conversation.record_exchange("a", "b");
        conversation.record_exchange("c", "d");
        let roles: Vec<_> = conversation.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[test]
    fn test_replace_artifact_removes_previous_dir() {
        let root = tempfile::tempdir().unwrap();
        let materializer = Materializer::new(Some(root.path().to_path_buf()));
        let mut session = session(ArtifactKind::Static);

        session.replace_artifact(materializer.materialize("one", "index.html").unwrap());
        let first_dir = session.artifact().unwrap().dir().to_path_buf();
        session.replace_artifact(materializer.materialize("two", "index.html").unwrap());

        assert!(!first_dir.exists());
        assert!(session.artifact_path().unwrap().exists());
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let root = tempfile::tempdir().unwrap();
        let runtime = Arc::new(InMemoryRuntime::new());
        let lifecycle = LifecycleManager::new(runtime.clone(), DEFAULT_CONTAINER_WORKDIR);
        let materializer = Materializer::new(Some(root.path().to_path_buf()));
        let mut session = session(ArtifactKind::Static);

        let artifact = materializer.materialize("<p/>", "index.html").unwrap();
        let dir = artifact.dir().to_path_buf();
        let container = lifecycle
            .launch(session.spec(), artifact.path())
            .await
            .unwrap();
        session.lock_selector();
        session.record_exchange("p", "r");
        session.replace_artifact(artifact);
        session.set_container(Some(container));

        let report = session.reset(&lifecycle).await;

        assert_eq!(report.stopped, Some(StopOutcome::Removed));
        assert!(report.removed_artifact);
        assert!(report.warnings.is_empty());
        assert!(session.conversation().is_empty());
        assert!(session.artifact().is_none());
        assert!(session.container().is_none());
        assert!(!session.selector_locked());
        assert!(!dir.exists());
        assert!(runtime.running().is_empty());
    }

    #[tokio::test]
    async fn test_reset_of_fresh_session_is_quiet() {
        let lifecycle =
            LifecycleManager::new(Arc::new(InMemoryRuntime::new()), DEFAULT_CONTAINER_WORKDIR);
        let mut session = session(ArtifactKind::Vue);
        let report = session.reset(&lifecycle).await;
        assert!(report.stopped.is_none());
        assert!(!report.removed_artifact);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_reset_reports_stop_failure() {
        let runtime = Arc::new(InMemoryRuntime::new());
        let lifecycle = LifecycleManager::new(runtime.clone(), DEFAULT_CONTAINER_WORKDIR);
        let mut session = session(ArtifactKind::Static);
        let container = lifecycle
            .launch(session.spec(), Path::new("/tmp/a/index.html"))
            .await
            .unwrap();
        session.set_container(Some(container));
        runtime.fail_stops_with(crate::errors::RuntimeError::Api("busy".into()));

        let report = session.reset(&lifecycle).await;
        assert_eq!(report.warnings.len(), 1);
        assert!(session.container().is_none());
        assert!(!session.selector_locked());
    }

    #[tokio::test]
    async fn test_download_without_container() {
        let lifecycle =
            LifecycleManager::new(Arc::new(InMemoryRuntime::new()), DEFAULT_CONTAINER_WORKDIR);
        let session = session(ArtifactKind::Static);
        assert!(matches!(
            session.download(&lifecycle).await,
            Err(SessionError::NoContainer)
        ));
    }
}
