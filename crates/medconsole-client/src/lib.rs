//! # medconsole-client
//!
//! Client side of the hospital administration console.
//!
//! - [`session`] - Access/refresh token and identity, mirrored to storage
//! - [`gateway`] - Request wrapper: base URL, bearer header, 401 handling
//! - [`auth`] - Login, registration, token refresh and logout
//! - [`hospitals`] - Hospital directory search and CRUD
//! - [`dicom`] - DICOM upload and metadata retrieval
//! - [`imaging`] - Base64 decode, resource lifecycle and the viewer
//! - [`panel`] - DICOM panel presentation state

pub mod auth;
pub mod config;
pub mod console;
pub mod dicom;
pub mod error;
pub mod gateway;
pub mod hospitals;
pub mod imaging;
pub mod navigation;
pub mod panel;
pub mod session;
pub mod storage;

pub use auth::AuthService;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use console::Console;
pub use dicom::{DicomTransfer, has_dicom_extension};
pub use error::{ClientError, Result};
pub use gateway::ApiClient;
pub use hospitals::{HospitalDirectory, HospitalFilter, HospitalSearch, SearchKind};
pub use imaging::{
    AttachOutcome, DecodeError, EngineError, ImageId, ImagingEngine, LoadedImage,
    MemoryResourceStore, Part10Engine, ResourceHandle, ResourceStore, SurfaceId, ViewState,
    Viewer, decode_payload, release_resource,
};
pub use navigation::{MemoryNavigator, Navigator, Route, require_session};
pub use panel::{Banner, DicomPanel, PanelState, PanelView, Severity};
pub use session::SessionStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
