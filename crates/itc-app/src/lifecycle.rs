use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use itc_core::error::{PipelineError, Stage};

/// Résultat de la purge post-run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The run directory was removed.
    Purged,
    /// Cleanup is disabled for this run.
    NotPerformed,
    /// Cleanup was requested but the removal failed (already logged).
    Failed,
}

/// Racine de staging partagée. Jamais supprimée.
///
/// Each run gets its own `run-*` directory under the root, so concurrent
/// runs and unrelated files living in the root are never touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Staging {
    /// Directory holding one subdirectory per run.
    pub root: PathBuf,
}

/// Zone de travail d'un run et ses sous-dossiers.
///
/// ```text
/// <root>/run-XXXX/staged/      raw bytes, one file per input
/// <root>/run-XXXX/frames/      every decoded frame as PNG
/// <root>/run-XXXX/normalized/  resized frames as PNG
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunArea {
    /// Directory owned by this run.
    pub dir: PathBuf,
    /// Acquired inputs.
    pub staged: PathBuf,
    /// Encoded frames before resizing.
    pub frames: PathBuf,
    /// Resized frames.
    pub normalized: PathBuf,
}

impl Staging {
    /// Layout under `root`. Touches nothing on disk.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reserve a fresh run directory under the root and lay it out.
    ///
    /// # Errors
    /// [`PipelineError::Write`] if the root or the run directory cannot be
    /// created.
    pub async fn prepare(&self) -> Result<RunArea, PipelineError> {
        let write_error = |path: &Path, source| PipelineError::Write {
            stage: Stage::Lifecycle,
            path: path.to_path_buf(),
            source,
        };
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| write_error(&self.root, e))?;

        let root = self.root.clone();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("run-")
                .tempdir_in(&root)
                .map(tempfile::TempDir::keep)
        })
        .await
        .map_err(|e| PipelineError::Aborted {
            stage: Stage::Lifecycle,
            reason: e.to_string(),
        })?
        .map_err(|e| write_error(&self.root, e))?;

        let area = RunArea::new(dir);
        area.reset().await?;
        Ok(area)
    }
}

impl RunArea {
    /// Layout under `dir`. Touches nothing on disk.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            staged: dir.join("staged"),
            frames: dir.join("frames"),
            normalized: dir.join("normalized"),
            dir,
        }
    }

    /// Empty and recreate the three subdirectories. Idempotent.
    ///
    /// # Errors
    /// [`PipelineError::Write`] if a subdirectory cannot be removed or created.
    pub async fn reset(&self) -> Result<(), PipelineError> {
        for sub in [&self.staged, &self.frames, &self.normalized] {
            let err = |source| PipelineError::Write {
                stage: Stage::Lifecycle,
                path: sub.clone(),
                source,
            };
            remove_tree(sub).await.map_err(err)?;
            tokio::fs::create_dir_all(sub).await.map_err(err)?;
        }
        Ok(())
    }

    /// Remove the run directory when `enabled`.
    ///
    /// # Errors
    /// [`PipelineError::Cleanup`] if the removal fails. A missing directory
    /// is not an error.
    pub async fn purge(&self, enabled: bool) -> Result<CleanupOutcome, PipelineError> {
        if !enabled {
            return Ok(CleanupOutcome::NotPerformed);
        }
        remove_tree(&self.dir)
            .await
            .map_err(|source| PipelineError::Cleanup {
                path: self.dir.clone(),
                source,
            })?;
        Ok(CleanupOutcome::Purged)
    }
}

async fn remove_tree(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
