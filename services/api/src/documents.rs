//! Uploaded document storage
//!
//! Documents are written to a local directory under a random name and
//! served back as static files under a fixed URL prefix.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::UploadConfig,
    error::{ApiError, ApiResult},
};

/// Accepted document extensions
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// Location of a stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    /// Public URL of the stored file
    pub url: String,
    /// Name the file was uploaded with
    pub filename: String,
}

/// Local directory document store
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
    url_prefix: String,
}

/// Lower-cased extension of `filename` if it is an accepted document type
pub fn validate_extension(filename: &str) -> ApiResult<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            ApiError::BadRequest(
                "File type not allowed. Only PDF and Word documents are accepted".to_string(),
            )
        })
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.dir.clone(), config.url_prefix.clone())
    }

    /// Directory the documents are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// URL prefix the stored files are served under
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Store `bytes` under a random name keeping the original extension
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> ApiResult<StoredDocument> {
        let extension = validate_extension(filename)?;
        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            ApiError::Internal(format!("Failed to create upload directory: {}", e))
        })?;
        tokio::fs::write(self.dir.join(&stored_name), bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to store document: {}", e)))?;

        info!("Stored document {} ({} bytes)", stored_name, bytes.len());

        Ok(StoredDocument {
            url: format!("{}/{}", self.url_prefix, stored_name),
            filename: filename.to_string(),
        })
    }

    /// Delete a document previously returned by [`save`](Self::save)
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn remove(&self, url: &str) {
        let Some(name) = url
            .strip_prefix(&self.url_prefix)
            .map(|rest| rest.trim_start_matches('/'))
            .filter(|name| !name.is_empty() && !name.contains('/') && !name.contains(".."))
        else {
            warn!("Refusing to remove document outside the store: {}", url);
            return;
        };

        if let Err(e) = tokio::fs::remove_file(self.dir.join(name)).await {
            warn!("Failed to remove document {}: {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> DocumentStore {
        let dir = std::env::temp_dir().join(format!("onboarding-docs-{}", Uuid::new_v4()));
        DocumentStore::new(dir, "/uploads/documents/")
    }

    #[test]
    fn test_validate_extension() {
        assert_eq!(validate_extension("mandato.pdf").unwrap(), "pdf");
        assert_eq!(validate_extension("Mandato.DOCX").unwrap(), "docx");
        assert_eq!(validate_extension("a.b.doc").unwrap(), "doc");

        for name in ["foto.png", "pdf", "script.pdf.exe", ""] {
            assert!(matches!(
                validate_extension(name),
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let store = temp_store();
        let stored = store.save("SEPA firmado.PDF", b"%PDF-1.4").await.unwrap();

        assert_eq!(stored.filename, "SEPA firmado.PDF");
        assert!(stored.url.starts_with("/uploads/documents/"));
        assert!(stored.url.ends_with(".pdf"));

        let name = stored.url.rsplit('/').next().unwrap();
        let path = store.dir().join(name);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4");

        store.remove(&stored.url).await;
        assert!(!path.exists());

        tokio::fs::remove_dir_all(store.dir()).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_rejects_bad_extension_without_writing() {
        let store = temp_store();
        assert!(store.save("virus.exe", b"MZ").await.is_err());
        assert!(!store.dir().exists());
    }

    #[tokio::test]
    async fn test_remove_ignores_foreign_paths() {
        let store = temp_store();
        store.remove("/etc/passwd").await;
        store.remove("/uploads/documents/../secret.pdf").await;
    }
}
