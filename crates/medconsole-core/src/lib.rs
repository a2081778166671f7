pub mod auth;
pub mod error;
pub mod hospital;
pub mod id;
pub mod imaging;
pub mod validation;

pub use auth::{Identity, LoginRequest, LoginResponse, RefreshResponse, RegisterRequest};
pub use error::{CoreError, ErrorCategory, Result};
pub use hospital::{Contact, ContactType, Hospital, HospitalPayload};
pub use id::HospitalId;
pub use imaging::{
    DicomMetadataResponse, ImagingFile, ImagingRecord, PatientDetails, StoredImage,
    UploadResponse, UploadResult,
};
pub use validation::{ValidationErrors, validate_hospital, validate_login, validate_registration};
