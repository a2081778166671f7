//! Presentation state of the DICOM panel for one hospital.
//!
//! The panel fetches the hospital's imaging record, decodes the payload
//! and attaches it to its [`Viewer`]. Results that arrive after the panel
//! moved on (another hospital opened, or closed) are dropped.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use medconsole_core::{HospitalId, ImagingRecord};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::dicom::{DicomTransfer, has_dicom_extension};
use crate::error::ClientError;
use crate::imaging::{ResourceStore, Viewer, decode_payload};

pub const MISSING_PAYLOAD: &str = "DICOM file data is missing from server response.";
pub const VIEW_UNAUTHORIZED: &str = "Please log in to access DICOM files.";
pub const VIEW_FORBIDDEN: &str = "Access forbidden. You may not have permission to view DICOM files.";
pub const VIEW_FAILED: &str = "Failed to load DICOM data";
pub const WRONG_EXTENSION: &str = "Please select a .dcm file";
pub const NO_HOSPITAL: &str = "Hospital ID is missing";
pub const UPLOAD_UNAUTHORIZED: &str = "Please log in to upload DICOM files.";
pub const UPLOAD_FORBIDDEN: &str =
    "Access forbidden. You may not have permission to upload DICOM files.";
pub const UPLOAD_FAILED: &str = "Upload failed. Please try again.";
pub const UPLOAD_SUCCEEDED: &str = "DICOM file uploaded successfully!";
pub const PREVIEW_UNAVAILABLE: &str =
    "Upload successful, but could not load image preview. Refresh to view.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub severity: Severity,
    pub text: String,
}

impl Banner {
    fn new(severity: Severity, text: &str) -> Self {
        Self {
            severity,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PanelView {
    #[default]
    Closed,
    Loading,
    /// No file stored; offer the upload.
    UploadPrompt,
    Viewing(ImagingRecord),
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub hospital_id: Option<HospitalId>,
    pub view: PanelView,
    pub banner: Option<Banner>,
    pub uploading: bool,
}

enum Action {
    View,
    Upload,
}

fn failure_banner(action: Action, error: &ClientError) -> Banner {
    let text = match (action, error.status()) {
        (Action::View, Some(401)) => VIEW_UNAUTHORIZED,
        (Action::View, Some(403)) => VIEW_FORBIDDEN,
        (Action::View, _) => VIEW_FAILED,
        (Action::Upload, Some(401)) => UPLOAD_UNAUTHORIZED,
        (Action::Upload, Some(403)) => UPLOAD_FORBIDDEN,
        (Action::Upload, _) => UPLOAD_FAILED,
    };
    Banner::new(Severity::Error, text)
}

pub struct DicomPanel {
    transfer: DicomTransfer,
    store: Arc<dyn ResourceStore>,
    viewer: Viewer,
    generation: AtomicU64,
    state: Mutex<PanelState>,
}

impl DicomPanel {
    pub fn new(transfer: DicomTransfer, store: Arc<dyn ResourceStore>, viewer: Viewer) -> Self {
        Self {
            transfer,
            store,
            viewer,
            generation: AtomicU64::new(0),
            state: Mutex::new(PanelState::default()),
        }
    }

    pub fn state(&self) -> PanelState {
        self.state.lock().clone()
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    /// Shows the imaging record of `hospital_id`.
    pub async fn open(&self, hospital_id: HospitalId) -> PanelState {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.viewer.clear();
        *self.state.lock() = PanelState {
            hospital_id: Some(hospital_id.clone()),
            view: PanelView::Loading,
            banner: None,
            uploading: false,
        };

        let fetched = self.transfer.fetch_metadata(&hospital_id).await;
        if !self.is_current(generation) {
            debug!(%hospital_id, "Dropping metadata for a panel that moved on");
            return self.state();
        }

        match fetched {
            Ok(record) => self.show_record(record, None).await,
            Err(e) => {
                warn!(
                    %hospital_id,
                    error = %e,
                    category = %e.category(),
                    "Failed to load DICOM metadata"
                );
                let mut state = self.state.lock();
                state.view = PanelView::Failed;
                state.banner = Some(failure_banner(Action::View, &e));
            }
        }
        self.state()
    }

    /// Uploads `path` for the open hospital, then re-fetches its record.
    pub async fn upload(&self, path: &Path) -> PanelState {
        let generation = self.generation.load(Ordering::Acquire);
        let hospital_id = {
            let mut state = self.state.lock();
            let Some(hospital_id) = state.hospital_id.clone() else {
                state.banner = Some(Banner::new(Severity::Error, NO_HOSPITAL));
                return state.clone();
            };
            if !has_dicom_extension(path) {
                state.banner = Some(Banner::new(Severity::Error, WRONG_EXTENSION));
                return state.clone();
            }
            state.uploading = true;
            state.banner = None;
            hospital_id
        };

        let uploaded = self.transfer.upload(&hospital_id, path).await;
        if !self.is_current(generation) {
            return self.state();
        }
        let uploaded = match uploaded {
            Ok(uploaded) => uploaded,
            Err(e) => {
                warn!(
                    %hospital_id,
                    error = %e,
                    category = %e.category(),
                    "DICOM upload failed"
                );
                let mut state = self.state.lock();
                state.uploading = false;
                state.banner = Some(failure_banner(Action::Upload, &e));
                return state.clone();
            }
        };

        let refetched = self.transfer.fetch_metadata(&hospital_id).await;
        if !self.is_current(generation) {
            return self.state();
        }
        match refetched {
            Ok(record) if record.exists() => {
                self.show_record(record, Some(Banner::new(Severity::Success, UPLOAD_SUCCEEDED)))
                    .await;
            }
            outcome => {
                if let Err(e) = &outcome {
                    warn!(
                        %hospital_id,
                        error = %e,
                        category = %e.category(),
                        "Re-fetch after upload failed"
                    );
                }
                self.viewer.clear();
                let mut state = self.state.lock();
                state.view = PanelView::Viewing(uploaded.into_record());
                state.banner = Some(Banner::new(Severity::Warning, PREVIEW_UNAVAILABLE));
            }
        }

        let mut state = self.state.lock();
        state.uploading = false;
        state.clone()
    }

    /// Leaves the panel; the viewer releases its resource after the grace
    /// delay if a load was still running.
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.viewer.clear();
        *self.state.lock() = PanelState::default();
    }

    async fn show_record(&self, record: ImagingRecord, success: Option<Banner>) {
        let Some(stored) = record.stored() else {
            let mut state = self.state.lock();
            state.view = PanelView::UploadPrompt;
            state.banner = None;
            return;
        };

        let decoded = stored
            .payload
            .as_deref()
            .map(|payload| decode_payload(payload, &self.store));

        {
            let mut state = self.state.lock();
            state.banner = match decoded {
                None => Some(Banner::new(Severity::Warning, MISSING_PAYLOAD)),
                Some(_) => success,
            };
            state.view = PanelView::Viewing(record.clone());
        }

        match decoded {
            None => self.viewer.clear(),
            Some(Err(e)) => self.viewer.fail_decode(&e),
            Some(Ok(handle)) => {
                self.viewer.attach(handle).await;
            }
        }
    }
}
