//! Object storage for uploaded files
//!
//! Keys follow `{kind}/{session_id}/{filename}`; the returned URL is what
//! gets persisted on the session row and handed to clients.

use async_trait::async_trait;
use intervo_common::{Error, Result};
use std::path::PathBuf;

/// Narrow upload interface the orchestrator consumes
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key` and return the public URL
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Filesystem-backed storage; files are served statically under
/// `public_base_url`
pub struct FsObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStorage {
    pub fn new(root: PathBuf, public_base_url: String) -> Self {
        Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        // Keys are server-generated, but never let a crafted filename escape
        // the storage root
        if key.split('/').any(|part| part == "..") {
            return Err(Error::InvalidInput(format!("Invalid storage key: {}", key)));
        }

        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_writes_file_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsObjectStorage::new(dir.path().to_path_buf(), "http://localhost:4100/uploads".into());

        let url = storage
            .upload("coverLetter/abc/resume.pdf", b"pdf bytes".to_vec(), "application/pdf")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:4100/uploads/coverLetter/abc/resume.pdf");
        let written = std::fs::read(dir.path().join("coverLetter/abc/resume.pdf")).unwrap();
        assert_eq!(written, b"pdf bytes");
    }

    #[tokio::test]
    async fn upload_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsObjectStorage::new(dir.path().to_path_buf(), "http://localhost".into());

        let result = storage.upload("coverLetter/../../etc/passwd", vec![1], "application/pdf").await;
        assert!(result.is_err());
    }
}
