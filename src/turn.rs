//! One user turn, prompt to running artifact.
//!
//! ```text
//! prompt ─▶ model stream ─▶ record exchange ─▶ extract ─▶ materialize ─▶ relaunch ─▶ install
//!              │                                  │            │              │
//!              └─ ModelStream                     └─ Extraction└─ Materialize └─ Launch
//! ```
//!
//! Each failure halts the turn. A model failure leaves the conversation
//! untouched; anything later happens after the exchange was recorded.

use std::path::PathBuf;

use futures::StreamExt;
use tracing::{info, warn};

use crate::errors::{ModelError, TurnError};
use crate::extract::extract_code_block;
use crate::lifecycle::{LifecycleManager, RunningContainer};
use crate::llm::{FragmentStream, ModelRouter};
use crate::materialize::Materializer;
use crate::session::Session;

/// Receives model output as it streams.
pub trait FragmentSink {
    fn fragment(&mut self, text: &str);
}

impl<F: FnMut(&str)> FragmentSink for F {
    fn fragment(&mut self, text: &str) {
        self(text)
    }
}

/// Discards fragments.
pub struct NullSink;

impl FragmentSink for NullSink {
    fn fragment(&mut self, _text: &str) {}
}

#[derive(Debug)]
pub struct TurnOutcome {
    /// Raw model output.
    pub response: String,
    /// The extracted code.
    pub code: String,
    pub artifact_path: Option<PathBuf>,
    pub container: Option<RunningContainer>,
    /// Set when the previous container could not be stopped.
    pub stop_warning: Option<String>,
}

/// Forward every fragment to `sink` and return the accumulated text.
pub async fn collect_response(
    mut stream: FragmentStream,
    sink: &mut dyn FragmentSink,
) -> Result<String, ModelError> {
    let mut response = String::new();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        if fragment.is_empty() {
            continue;
        }
        sink.fragment(&fragment);
        response.push_str(&fragment);
    }

    if response.trim().is_empty() {
        return Err(ModelError::Empty);
    }
    Ok(response)
}

pub struct TurnRunner {
    models: ModelRouter,
    lifecycle: LifecycleManager,
    materializer: Materializer,
}

impl TurnRunner {
    pub fn new(models: ModelRouter, lifecycle: LifecycleManager, materializer: Materializer) -> Self {
        Self {
            models,
            lifecycle,
            materializer,
        }
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn models(&self) -> &ModelRouter {
        &self.models
    }

    pub async fn run_turn(
        &self,
        session: &mut Session,
        prompt: &str,
        sink: &mut dyn FragmentSink,
    ) -> Result<TurnOutcome, TurnError> {
        session.lock_selector();
        let spec = session.spec().clone();

        let backend = self.models.select(session.local_mode());
        info!(kind = %spec.kind, model = %backend.describe(), "starting turn");
        let messages = session.history(prompt);
        let stream = backend.stream_chat(&messages).await?;
        let response = collect_response(stream, sink).await?;

        session.record_exchange(prompt, &response);

        let code = extract_code_block(&response, spec.fence_tag)?;

        let Some(file_name) = spec.output_file_name else {
            return Ok(TurnOutcome {
                response,
                code,
                artifact_path: None,
                container: None,
                stop_warning: None,
            });
        };

        let artifact = self.materializer.materialize(&code, file_name)?;
        let artifact_path = artifact.path().to_path_buf();

        let mut container = None;
        let mut stop_warning = None;
        if spec.launch.is_some() {
            match self.lifecycle.relaunch(&spec, &artifact_path).await {
                Ok(relaunched) => {
                    stop_warning = relaunched.previous.err().map(|e| e.to_string());
                    container = Some(relaunched.container);
                }
                Err(e) => {
                    // The previous container is gone either way; keep the new
                    // code so a reset or the next turn still finds it.
                    warn!(error = %e, "launch failed");
                    session.replace_artifact(artifact);
                    session.set_container(None);
                    return Err(e.into());
                }
            }
        }

        session.replace_artifact(artifact);
        session.set_container(container.clone());

        Ok(TurnOutcome {
            response,
            code,
            artifact_path: Some(artifact_path),
            container,
            stop_warning,
        })
    }
}
