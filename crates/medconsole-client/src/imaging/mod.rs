//! Base64 payload to on-screen image.
//!
//! [`decode_payload`] turns the transport text into a [`ResourceHandle`];
//! a [`Viewer`] hands that handle to an [`ImagingEngine`] and owns it until
//! the next attach or clear.

pub mod decode;
pub mod engine;
pub mod part10;
pub mod resource;
pub mod viewer;

pub use decode::{DecodeError, MIN_PAYLOAD_CHARS, clean_payload, decode_bytes, decode_payload};
pub use engine::{EngineError, ImagingEngine, LoadedImage, SurfaceId};
pub use part10::{Part10Engine, TRANSFER_SYNTAX_NAME, read_meta, transfer_syntax_name};
pub use resource::{
    Blob, DICOM_MIME, ImageId, LOADER_SCHEME, MemoryResourceStore, ResourceHandle, ResourceStore,
    release_resource,
};
pub use viewer::{AttachOutcome, ViewState, Viewer};
