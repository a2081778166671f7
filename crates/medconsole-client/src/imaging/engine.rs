//! Seam between the viewer and whatever renders DICOM images.

use std::fmt;

use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;

use super::resource::ImageId;

/// A rendering surface an engine can be enabled on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An image the engine has parsed and can display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub image_id: ImageId,
    pub byte_len: usize,
    /// Header attributes by display name, in file order.
    pub attributes: IndexMap<String, String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("No loader registered for '{0}'")]
    UnknownScheme(String),

    #[error("Image resource is no longer available: {0}")]
    ResourceRevoked(String),

    #[error("Not a DICOM file: {0}")]
    NotDicom(String),

    #[error("Malformed DICOM header: {0}")]
    Malformed(String),

    #[error("Engine is not enabled on surface '{0}'")]
    SurfaceNotEnabled(String),
}

#[async_trait]
pub trait ImagingEngine: Send + Sync {
    fn enable(&self, surface: &SurfaceId);

    fn disable(&self, surface: &SurfaceId);

    async fn load_image(&self, image_id: &ImageId) -> Result<LoadedImage, EngineError>;

    fn display_image(&self, surface: &SurfaceId, image: &LoadedImage) -> Result<(), EngineError>;
}
