//! Durable local storage for build artifacts.
//!
//! The sink is best-effort by contract: callers report a failed store as a
//! warning and move on, it never changes the outcome of the invocation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Durable storage for the original report file and for undelivered batches.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store raw bytes under `name`.
    async fn store(&self, name: &str, payload: &[u8]) -> Result<()>;

    /// Store a copy of an existing file under `name`.
    async fn store_file(&self, name: &str, path: &Path) -> Result<()>;
}

/// Sink that drops artifacts into a local directory.
///
/// The directory is what the surrounding CI workflow collects as build
/// artifacts; it is created on first use.
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create artifact directory {}", self.dir.display()))
    }
}

#[async_trait]
impl ArtifactSink for DirSink {
    async fn store(&self, name: &str, payload: &[u8]) -> Result<()> {
        self.ensure_dir().await?;
        let target = self.dir.join(name);
        tokio::fs::write(&target, payload)
            .await
            .with_context(|| format!("failed to write artifact {}", target.display()))?;
        info!("stored artifact {}", target.display());
        Ok(())
    }

    async fn store_file(&self, name: &str, path: &Path) -> Result<()> {
        self.ensure_dir().await?;
        let target = self.dir.join(name);
        tokio::fs::copy(path, &target)
            .await
            .with_context(|| format!("failed to copy {} to {}", path.display(), target.display()))?;
        info!("stored artifact {}", target.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_writes_bytes_under_name() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirSink::new(dir.path().join("artifacts"));

        sink.store("batch.json", b"[1,2,3]").await.unwrap();

        let written = std::fs::read(dir.path().join("artifacts/batch.json")).unwrap();
        assert_eq!(written, b"[1,2,3]");
    }

    #[tokio::test]
    async fn store_file_copies_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.json");
        std::fs::write(&source, br#"{"tests":[]}"#).unwrap();
        let sink = DirSink::new(dir.path().join("artifacts"));

        sink.store_file("copy.json", &source).await.unwrap();

        let written = std::fs::read(dir.path().join("artifacts/copy.json")).unwrap();
        assert_eq!(written, br#"{"tests":[]}"#);
    }

    #[tokio::test]
    async fn store_file_reports_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirSink::new(dir.path().join("artifacts"));

        let result = sink
            .store_file("copy.json", &dir.path().join("nope.json"))
            .await;
        assert!(result.is_err());
    }
}
