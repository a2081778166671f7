//! Imaging (DICOM) records attached to a hospital.
//!
//! The backend answers the metadata endpoint with a loose object whose
//! fields are present or not depending on whether a file was stored.
//! [`DicomMetadataResponse`] mirrors that object; [`ImagingRecord`] is the
//! typed form the rest of the client works with.

use serde::{Deserialize, Serialize};

use crate::id::HospitalId;

/// Patient attributes extracted by the backend from the stored file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDetails {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub age: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
}

impl PatientDetails {
    /// Label/value rows in display order; absent values render as `N/A`.
    pub fn rows(&self) -> [(&'static str, &str); 6] {
        fn show(value: &Option<String>) -> &str {
            match value.as_deref() {
                Some(s) if !s.trim().is_empty() => s,
                _ => "N/A",
            }
        }
        [
            ("Patient Name", show(&self.patient_name)),
            ("Patient ID", show(&self.patient_id)),
            ("Birth Date", show(&self.birth_date)),
            ("Sex", show(&self.sex)),
            ("Age", show(&self.age)),
            ("Upload Date", show(&self.upload_date)),
        ]
    }
}

/// Raw body of `GET /hospital/{id}/dicom`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DicomMetadataResponse {
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub hospital_code: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub dicom_id: Option<String>,
    #[serde(default)]
    pub dicom_file_base64: Option<String>,
    #[serde(default)]
    pub patient_details: Option<PatientDetails>,
}

impl DicomMetadataResponse {
    pub fn into_record(self, hospital_id: HospitalId) -> ImagingRecord {
        let file = if self.has_file {
            ImagingFile::Stored(StoredImage {
                hospital_code: self.hospital_code,
                dicom_id: self.dicom_id,
                patient: self.patient_details,
                payload: self.dicom_file_base64.filter(|p| !p.trim().is_empty()),
            })
        } else {
            ImagingFile::Missing
        };
        ImagingRecord { hospital_id, file }
    }
}

/// Raw body of `POST /hospital/{id}/dicom`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub hospital_code: Option<String>,
    #[serde(default)]
    pub detailed_response: Option<PatientDetails>,
}

/// What an upload reported, before any re-fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub hospital_id: HospitalId,
    pub hospital_code: Option<String>,
    pub patient: Option<PatientDetails>,
}

impl UploadResult {
    pub fn from_response(hospital_id: HospitalId, response: UploadResponse) -> Self {
        Self {
            hospital_id,
            hospital_code: response.hospital_code,
            patient: response.detailed_response,
        }
    }

    /// A stored record built from the upload response alone. It never
    /// carries a payload, so it cannot be previewed.
    pub fn into_record(self) -> ImagingRecord {
        let dicom_id = self.patient.as_ref().and_then(|p| p.patient_id.clone());
        ImagingRecord {
            hospital_id: self.hospital_id,
            file: ImagingFile::Stored(StoredImage {
                hospital_code: self.hospital_code,
                dicom_id,
                patient: self.patient,
                payload: None,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagingRecord {
    pub hospital_id: HospitalId,
    pub file: ImagingFile,
}

impl ImagingRecord {
    pub fn missing(hospital_id: HospitalId) -> Self {
        Self {
            hospital_id,
            file: ImagingFile::Missing,
        }
    }

    pub fn exists(&self) -> bool {
        matches!(self.file, ImagingFile::Stored(_))
    }

    pub fn stored(&self) -> Option<&StoredImage> {
        match &self.file {
            ImagingFile::Stored(image) => Some(image),
            ImagingFile::Missing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagingFile {
    Missing,
    Stored(StoredImage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub hospital_code: Option<String>,
    pub dicom_id: Option<String>,
    pub patient: Option<PatientDetails>,
    /// Base64 text of the file, when the backend included it.
    pub payload: Option<String>,
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
