use serde::{Deserialize, Serialize};

/// Response body for `POST /api/upload`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: Option<String>,
}

/// A file written to the upload directory
#[derive(Debug, Clone, PartialEq)]
pub struct StoredUpload {
    /// Path as reported to clients: `<upload_dir>/<file_name>`
    pub path: String,
    pub file_name: String,
    pub size: u64,
}

impl From<Option<StoredUpload>> for UploadResponse {
    fn from(upload: Option<StoredUpload>) -> Self {
        Self {
            image_url: upload.map(|u| u.path),
        }
    }
}
