//! Local filesystem document store
//!
//! Layout under the configured directories:
//! - `uploads/`   original PDFs (`temp_<name>` while an upload is in flight)
//! - `json/`      comparison artifacts produced by the proofreading service
//! - `generated/` proofread PDFs produced by the proofreading service

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::core::config::StorageConfig;
use crate::shared::constants::TEMP_FILE_PREFIX;

/// File operations the upload and comparison flows depend on
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write an in-flight upload as `temp_<name>` and return its path
    async fn write_temp(&self, name: &str, data: &[u8]) -> io::Result<PathBuf>;

    /// Atomically move `temp_<name>` to `<name>`
    async fn promote(&self, name: &str) -> io::Result<()>;

    /// Remove `temp_<name>`; a missing file is not an error
    async fn discard_temp(&self, name: &str) -> io::Result<()>;

    /// Remove a finalized upload; a missing file is not an error
    async fn discard(&self, name: &str) -> io::Result<()>;

    /// Read a comparison artifact from the json directory
    async fn read_artifact(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Replace a comparison artifact: written as `temp_<name>` beside it,
    /// then renamed over the old one
    async fn write_artifact(&self, name: &str, data: &[u8]) -> io::Result<()>;

    /// Read a proofread PDF from the generated directory
    async fn read_generated(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Path recorded in `uploads.file_path` for a finalized upload
    fn upload_path(&self, name: &str) -> String;
}

pub struct LocalDocumentStore {
    uploads_dir: PathBuf,
    json_dir: PathBuf,
    generated_dir: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            uploads_dir: config.uploads_dir.clone(),
            json_dir: config.json_dir.clone(),
            generated_dir: config.generated_dir.clone(),
        }
    }

    /// Create the storage directories if they don't exist yet
    pub async fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [&self.uploads_dir, &self.json_dir, &self.generated_dir] {
            fs::create_dir_all(dir).await?;
            debug!("Storage directory ready: {}", dir.display());
        }
        Ok(())
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        self.uploads_dir.join(format!("{}{}", TEMP_FILE_PREFIX, name))
    }

    fn final_path(&self, name: &str) -> PathBuf {
        self.uploads_dir.join(name)
    }
}

async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn write_temp(&self, name: &str, data: &[u8]) -> io::Result<PathBuf> {
        let path = self.temp_path(name);
        fs::write(&path, data).await?;
        debug!("Temp upload written: {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }

    async fn promote(&self, name: &str) -> io::Result<()> {
        let from = self.temp_path(name);
        let to = self.final_path(name);
        fs::rename(&from, &to).await?;
        info!("Upload finalized: {}", to.display());
        Ok(())
    }

    async fn discard_temp(&self, name: &str) -> io::Result<()> {
        remove_if_exists(&self.temp_path(name)).await
    }

    async fn discard(&self, name: &str) -> io::Result<()> {
        remove_if_exists(&self.final_path(name)).await
    }

    async fn read_artifact(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.json_dir.join(name)).await
    }

    async fn write_artifact(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let temp = self
            .json_dir
            .join(format!("{}{}", TEMP_FILE_PREFIX, name));
        let target = self.json_dir.join(name);

        fs::write(&temp, data).await?;
        if let Err(e) = fs::rename(&temp, &target).await {
            remove_if_exists(&temp).await?;
            return Err(e);
        }
        info!("Artifact rewritten: {} ({} bytes)", target.display(), data.len());
        Ok(())
    }

    async fn read_generated(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.generated_dir.join(name)).await
    }

    fn upload_path(&self, name: &str) -> String {
        self.final_path(name).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(root: &Path) -> LocalDocumentStore {
        LocalDocumentStore::new(&StorageConfig {
            uploads_dir: root.join("uploads"),
            json_dir: root.join("json"),
            generated_dir: root.join("generated"),
        })
    }

    #[tokio::test]
    async fn test_temp_write_then_promote() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_dirs().await.unwrap();

        let temp = store.write_temp("a.pdf", b"%PDF-1.4").await.unwrap();
        assert!(temp.ends_with("uploads/temp_a.pdf"));

        store.promote("a.pdf").await.unwrap();
        assert!(!temp.exists());
        assert_eq!(
            std::fs::read(dir.path().join("uploads/a.pdf")).unwrap(),
            b"%PDF-1.4"
        );
    }

    #[tokio::test]
    async fn test_promote_without_temp_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_dirs().await.unwrap();

        assert!(store.promote("missing.pdf").await.is_err());
    }

    #[tokio::test]
    async fn test_discard_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_dirs().await.unwrap();

        store.write_temp("b.pdf", b"x").await.unwrap();
        store.discard_temp("b.pdf").await.unwrap();
        store.discard_temp("b.pdf").await.unwrap();
        store.discard("never-existed.pdf").await.unwrap();

        assert!(!dir.path().join("uploads/temp_b.pdf").exists());
    }

    #[tokio::test]
    async fn test_write_artifact_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_dirs().await.unwrap();
        std::fs::write(dir.path().join("json/r.json"), b"{\"v\":1}").unwrap();

        store.write_artifact("r.json", b"{\"v\":2}").await.unwrap();

        assert_eq!(store.read_artifact("r.json").await.unwrap(), b"{\"v\":2}");
        assert_eq!(
            std::fs::read_dir(dir.path().join("json")).unwrap().count(),
            1
        );
    }

    #[tokio::test]
    async fn test_read_generated_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_dirs().await.unwrap();
        std::fs::write(dir.path().join("generated/out.pdf"), b"%PDF-1.7").unwrap();

        assert_eq!(store.read_generated("out.pdf").await.unwrap(), b"%PDF-1.7");
        assert!(store.read_generated("r.json").await.is_err());
    }

    #[tokio::test]
    async fn test_read_artifact_from_json_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_dirs().await.unwrap();
        std::fs::write(dir.path().join("json/r.json"), b"{}").unwrap();

        assert_eq!(store.read_artifact("r.json").await.unwrap(), b"{}");
        assert_eq!(
            store.upload_path("c.pdf"),
            dir.path().join("uploads/c.pdf").to_string_lossy()
        );
    }
}
