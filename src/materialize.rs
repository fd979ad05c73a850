//! Writing generated code to a fresh temporary directory.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::errors::MaterializeError;

const DIR_PREFIX: &str = "artifact-";

/// A generated artifact written to its own temporary directory.
///
/// The directory is removed when the value is dropped or discarded, unless
/// it has been persisted.
#[derive(Debug)]
pub struct MaterializedArtifact {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl MaterializedArtifact {
    /// Absolute path of the written file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory holding the file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    /// Keep the directory on disk past the lifetime of this value.
    pub fn persist(mut self) -> PathBuf {
        if let Some(dir) = self.dir.take() {
            let _ = dir.keep();
        }
        self.path
    }

    /// Remove the directory now. A directory that is already gone is not an error.
    pub fn discard(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => match dir.close() {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
            None => Ok(()),
        }
    }
}

/// Creates one uniquely named directory per artifact.
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    root: Option<PathBuf>,
}

impl Materializer {
    /// `root` defaults to the system temp directory.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Remove the artifact directory behind `mounted` (the directory itself or
    /// a file in it) if this materializer created it.
    ///
    /// Only `artifact-*` directories directly under the root are touched.
    /// Returns the removed directory.
    pub fn reclaim(&self, mounted: &Path) -> io::Result<Option<PathBuf>> {
        let Ok(root) = self.root().canonicalize() else {
            return Ok(None);
        };
        let mounted = match mounted.canonicalize() {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let dir = if mounted.is_dir() {
            mounted.as_path()
        } else {
            match mounted.parent() {
                Some(parent) => parent,
                None => return Ok(None),
            }
        };
        let owned = dir.parent() == Some(root.as_path())
            && dir
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with(DIR_PREFIX));
        if !owned {
            return Ok(None);
        }

        std::fs::remove_dir_all(dir)?;
        debug!(dir = %dir.display(), "reclaimed artifact directory");
        Ok(Some(dir.to_path_buf()))
    }

    /// Write `code` verbatim to `<fresh dir>/<file_name>`.
    pub fn materialize(
        &self,
        code: &str,
        file_name: &str,
    ) -> Result<MaterializedArtifact, MaterializeError> {
        let root = self.root();
        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir_in(&root)
            .map_err(|source| MaterializeError::TempDir {
                root: root.clone(),
                source,
            })?;

        let path = dir.path().join(file_name);
        std::fs::write(&path, code).map_err(|source| MaterializeError::Write {
            path: path.clone(),
            source,
        })?;

        let path = path.canonicalize().unwrap_or(path);
        debug!(path = %path.display(), bytes = code.len(), "materialized artifact");

        Ok(MaterializedArtifact {
            dir: Some(dir),
            path,
        })
    }
}
