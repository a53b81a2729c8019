use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::models::{StoredUpload, UploadError};

/// Name used when the client-supplied filename has no usable component
pub const FALLBACK_FILE_NAME: &str = "upload";

/// Disk-backed store for uploaded files
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it is missing
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| UploadError::Io {
                path: self.dir.display().to_string(),
                source,
            })?;

        info!(upload_dir = %self.dir.display(), "Upload directory ready");
        Ok(())
    }

    /// Stored filename: `<timestamp-millis>-<original-name>`
    pub fn stored_file_name(timestamp_millis: i64, original_name: &str) -> String {
        format!("{}-{}", timestamp_millis, sanitize_file_name(original_name))
    }

    /// Path reported back to clients for a stored file
    pub fn public_path(&self, file_name: &str) -> String {
        let dir = self.dir.to_string_lossy();
        let dir = dir.trim_end_matches(['/', '\\']);
        if dir.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", dir, file_name)
        }
    }

    /// Write a file's bytes under a generated name
    #[instrument(skip(self, contents), fields(original_name = %original_name, size = contents.len()))]
    pub async fn save(
        &self,
        timestamp_millis: i64,
        original_name: &str,
        contents: &[u8],
    ) -> Result<StoredUpload, UploadError> {
        let file_name = Self::stored_file_name(timestamp_millis, original_name);
        let target = self.dir.join(&file_name);

        let io_error = |source| UploadError::Io {
            path: target.display().to_string(),
            source,
        };

        let mut file = tokio::fs::File::create(&target).await.map_err(io_error)?;
        file.write_all(contents).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;

        debug!(path = %target.display(), "Upload written to disk");

        Ok(StoredUpload {
            path: self.public_path(&file_name),
            file_name,
            size: contents.len() as u64,
        })
    }
}

/// Keep only the final path component of a client-supplied filename
pub fn sanitize_file_name(original_name: &str) -> String {
    let last = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if last.is_empty() || last == "." || last == ".." {
        FALLBACK_FILE_NAME.to_string()
    } else {
        last.chars().filter(|c| !c.is_control()).collect()
    }
}
