use std::sync::Arc;
use tracing::instrument;

use crate::models::{ServiceResult, StoredUpload, UploadError};
use crate::observability::Metrics;
use crate::repositories::UploadStore;

/// Form field that carries the uploaded image
pub const IMAGE_FIELD: &str = "image";

/// Service for storing uploaded pet images
pub struct UploadService {
    store: UploadStore,
    metrics: Arc<Metrics>,
}

impl UploadService {
    pub fn new(store: UploadStore, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    /// Persist an uploaded image under `<timestamp-millis>-<original-name>`
    #[instrument(skip(self, contents), fields(original_name = %original_name, size = contents.len()))]
    pub async fn store_image(
        &self,
        original_name: &str,
        contents: &[u8],
    ) -> ServiceResult<StoredUpload> {
        let timestamp = chrono::Utc::now().timestamp_millis();

        match self.store.save(timestamp, original_name, contents).await {
            Ok(stored) => {
                self.metrics.record_upload("stored", stored.size);
                crate::info_with_trace!(path = %stored.path, "Image stored");
                Ok(stored)
            }
            Err(error) => {
                self.metrics.record_upload("error", 0);
                crate::error_with_trace!(error = %error, "Failed to store image");
                Err(error.into())
            }
        }
    }

    /// Note a request that carried no image file
    pub fn record_missing_image(&self) {
        self.metrics.record_upload("empty", 0);
        crate::info_with_trace!("Upload request without an image file");
    }

    /// Note a request whose multipart body could not be read
    pub fn record_rejected(&self, error: &UploadError) {
        self.metrics.record_upload("error", 0);
        crate::warn_with_trace!(error = %error, "Rejected upload body");
    }
}
