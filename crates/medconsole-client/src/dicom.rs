//! Upload and retrieval of the one DICOM file a hospital may hold.

use std::path::Path;
use std::sync::Arc;

use medconsole_core::{
    DicomMetadataResponse, HospitalId, ImagingRecord, UploadResponse, UploadResult,
};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::gateway::ApiClient;
use crate::imaging::DICOM_MIME;

pub const UPLOAD_FIELD: &str = "file";

/// Whether `path` carries the `.dcm` extension, in any case.
pub fn has_dicom_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
}

fn dicom_path(id: &HospitalId) -> String {
    format!("/hospital/{id}/dicom")
}

#[derive(Debug, Clone)]
pub struct DicomTransfer {
    api: Arc<ApiClient>,
}

impl DicomTransfer {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// A 404 means the hospital has no file yet, which is not an error.
    pub async fn fetch_metadata(&self, id: &HospitalId) -> Result<ImagingRecord> {
        match self
            .api
            .get_json::<DicomMetadataResponse>(&dicom_path(id), &[])
            .await
        {
            Ok(response) => {
                let record = response.into_record(id.clone());
                debug!(%id, exists = record.exists(), "Fetched DICOM metadata");
                Ok(record)
            }
            Err(e) if e.is_not_found() => {
                debug!(%id, "No DICOM file stored");
                Ok(ImagingRecord::missing(id.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// Sends the file as multipart field `file`. Callers re-fetch the
    /// metadata afterwards; the response never carries the payload.
    pub async fn upload(&self, id: &HospitalId, path: &Path) -> Result<UploadResult> {
        if !has_dicom_extension(path) {
            return Err(ClientError::invalid_file("Please select a .dcm file"));
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.dcm")
            .to_string();
        self.upload_bytes(id, file_name, bytes).await
    }

    pub async fn upload_bytes(
        &self,
        id: &HospitalId,
        file_name: String,
        bytes: Vec<u8>,
    ) -> Result<UploadResult> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(DICOM_MIME)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let body = self.api.post_multipart(&dicom_path(id), form).await?;
        let response = if body.trim().is_empty() {
            UploadResponse::default()
        } else {
            serde_json::from_str(&body)
                .map_err(|e| ClientError::invalid_response(format!("upload response: {e}")))?
        };
        info!(%id, bytes = size, "DICOM file uploaded");
        Ok(UploadResult::from_response(id.clone(), response))
    }
}
