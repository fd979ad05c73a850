//! Typed error hierarchy for artifactor.
//!
//! One enum per subsystem:
//! - `ExtractError`: no usable fenced code block in a model response
//! - `MaterializeError`: writing generated code to disk
//! - `RuntimeError`: container runtime calls (Docker or in-memory)
//! - `LifecycleError`: container lifecycle operations, wrapping `RuntimeError`
//! - `ModelError`: model backend request and fragment stream
//! - `TurnError`: the fatal outcomes of a single user turn
//! - `SessionError`: session-level actions (kind selection, download)

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::ArtifactKind;

/// Errors from pulling a fenced code block out of model output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("No ```{tag} code block found in the response")]
    NoFence { tag: String },

    #[error("The ```{tag} code block in the response is empty")]
    EmptyBlock { tag: String },
}

/// Errors from writing generated code to a temporary location.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Failed to create temporary directory under {root}: {source}")]
    TempDir {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write artifact to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by a container runtime.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("No such container: {name}")]
    NotFound { name: String },

    #[error("Container name '{name}' is already in use")]
    Conflict { name: String },

    #[error("Image '{image}' is not available locally")]
    ImageMissing { image: String },

    #[error("Container runtime unavailable: {0}")]
    Unavailable(String),

    #[error("Container runtime error: {0}")]
    Api(String),
}

/// Errors from the container lifecycle manager.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Artifact type '{kind}' has no container launch configuration")]
    NoLaunchSpec { kind: ArtifactKind },

    #[error("Failed to launch container {name}: {source}")]
    Launch {
        name: String,
        #[source]
        source: RuntimeError,
    },

    #[error("Failed to stop container {name}: {source}")]
    Stop {
        name: String,
        #[source]
        source: RuntimeError,
    },

    #[error("Failed to archive {path} from container {container}: {source}")]
    Archive {
        container: String,
        path: String,
        #[source]
        source: RuntimeError,
    },
}

impl LifecycleError {
    /// The runtime error underneath, if any.
    pub fn runtime_error(&self) -> Option<&RuntimeError> {
        match self {
            LifecycleError::NoLaunchSpec { .. } => None,
            LifecycleError::Launch { source, .. }
            | LifecycleError::Stop { source, .. }
            | LifecycleError::Archive { source, .. } => Some(source),
        }
    }
}

/// Errors from the model backend.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode model stream event: {0}")]
    Decode(String),

    #[error("Model stream interrupted: {0}")]
    Stream(String),

    #[error("Model returned an empty response")]
    Empty,
}

/// Fatal outcomes of a single turn. Each one halts the turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    ModelStream(#[from] ModelError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    #[error(transparent)]
    Launch(#[from] LifecycleError),
}

/// Errors from session-level actions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Artifact type is locked to '{current}' until the session is reset")]
    SelectorLocked { current: ArtifactKind },

    #[error("Cannot download files at the moment: no container is running for this session")]
    NoContainer,

    #[error(transparent)]
    Archive(#[from] LifecycleError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_error_names_the_tag() {
        let err = ExtractError::NoFence {
            tag: "html".to_string(),
        };
        assert!(err.to_string().contains("```html"));
    }

    #[test]
    fn materialize_error_carries_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = MaterializeError::Write {
            path: PathBuf::from("/tmp/artifact-x/index.html"),
            source: io_err,
        };
        match &err {
            MaterializeError::Write { path, source } => {
                assert_eq!(path, &PathBuf::from("/tmp/artifact-x/index.html"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected Write"),
        }
        assert!(err.to_string().contains("index.html"));
    }

    #[test]
    fn lifecycle_error_exposes_runtime_error() {
        let err = LifecycleError::Launch {
            name: "artifact-static".to_string(),
            source: RuntimeError::Conflict {
                name: "artifact-static".to_string(),
            },
        };
        assert!(matches!(
            err.runtime_error(),
            Some(RuntimeError::Conflict { .. })
        ));
        assert!(err.to_string().contains("artifact-static"));

        let err = LifecycleError::NoLaunchSpec {
            kind: ArtifactKind::Vue,
        };
        assert!(err.runtime_error().is_none());
    }

    #[test]
    fn turn_error_converts_from_subsystem_errors() {
        let err: TurnError = ExtractError::NoFence {
            tag: "vue".to_string(),
        }
        .into();
        assert!(matches!(err, TurnError::Extraction(_)));

        let err: TurnError = ModelError::Empty.into();
        assert!(matches!(err, TurnError::ModelStream(ModelError::Empty)));
    }

    #[test]
    fn session_error_mentions_locked_kind() {
        let err = SessionError::SelectorLocked {
            current: ArtifactKind::Streamlit,
        };
        assert!(err.to_string().contains("streamlit"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ExtractError::NoFence { tag: "x".into() });
        assert_std_error(&RuntimeError::Unavailable("down".into()));
        assert_std_error(&ModelError::Empty);
        assert_std_error(&SessionError::NoContainer);
    }
}
