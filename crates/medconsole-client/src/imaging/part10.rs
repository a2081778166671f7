//! Header-level DICOM engine.
//!
//! Resolves `wadouri:` ids through the resource store, checks the Part 10
//! preamble and reads the file meta information group. Pixel data is not
//! decoded; "display" records which image a surface shows.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dicom_core::Tag;
use dicom_core::dictionary::{DataDictionary, DataDictionaryEntry};
use dicom_dictionary_std::{StandardDataDictionary, tags};
use dicom_encoding::transfer_syntax::TransferSyntaxIndex;
use dicom_object::FileMetaTable;
use dicom_transfer_syntax_registry::TransferSyntaxRegistry;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use super::engine::{EngineError, ImagingEngine, LoadedImage, SurfaceId};
use super::resource::{ImageId, LOADER_SCHEME, ResourceStore};

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

/// Attribute holding the human name of the transfer syntax.
pub const TRANSFER_SYNTAX_NAME: &str = "Transfer Syntax";

/// Dictionary keyword of a tag, or its `(gggg,eeee)` form.
fn attribute_name(tag: Tag) -> String {
    StandardDataDictionary
        .by_tag(tag)
        .map(|entry| entry.alias().to_string())
        .unwrap_or_else(|| tag.to_string())
}

fn trim_value(value: &str) -> &str {
    value.trim_end_matches(['\0', ' '])
}

/// Human name of a transfer syntax UID.
pub fn transfer_syntax_name(uid: &str) -> Option<&'static str> {
    TransferSyntaxRegistry
        .get(trim_value(uid))
        .map(|ts| ts.name())
}

/// Reads the file meta information of a Part 10 file.
///
/// Attributes are keyed by dictionary keyword, plus [`TRANSFER_SYNTAX_NAME`]
/// when the transfer syntax is registered.
pub fn read_meta(bytes: &[u8]) -> Result<IndexMap<String, String>, EngineError> {
    if bytes.len() < PREAMBLE_LEN + MAGIC.len() {
        return Err(EngineError::NotDicom(format!(
            "{} bytes is shorter than the Part 10 preamble",
            bytes.len()
        )));
    }
    if &bytes[PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()] != MAGIC {
        return Err(EngineError::NotDicom("missing DICM prefix".to_string()));
    }

    let meta = FileMetaTable::from_reader(&bytes[PREAMBLE_LEN..])
        .map_err(|e| EngineError::Malformed(e.to_string()))?;

    let syntax = trim_value(&meta.transfer_syntax);
    if syntax.is_empty() {
        return Err(EngineError::Malformed("missing transfer syntax".to_string()));
    }

    let fields = [
        (
            tags::MEDIA_STORAGE_SOP_CLASS_UID,
            Some(meta.media_storage_sop_class_uid.as_str()),
        ),
        (
            tags::MEDIA_STORAGE_SOP_INSTANCE_UID,
            Some(meta.media_storage_sop_instance_uid.as_str()),
        ),
        (tags::TRANSFER_SYNTAX_UID, Some(syntax)),
        (
            tags::IMPLEMENTATION_CLASS_UID,
            Some(meta.implementation_class_uid.as_str()),
        ),
        (
            tags::IMPLEMENTATION_VERSION_NAME,
            meta.implementation_version_name.as_deref(),
        ),
        (
            tags::SOURCE_APPLICATION_ENTITY_TITLE,
            meta.source_application_entity_title.as_deref(),
        ),
    ];

    let mut attributes = IndexMap::new();
    for (tag, value) in fields {
        if let Some(value) = value.map(trim_value).filter(|v| !v.is_empty()) {
            attributes.insert(attribute_name(tag), value.to_string());
        }
    }
    if let Some(name) = transfer_syntax_name(syntax) {
        attributes.insert(TRANSFER_SYNTAX_NAME.to_string(), name.to_string());
    }

    Ok(attributes)
}

pub struct Part10Engine {
    store: Arc<dyn ResourceStore>,
    surfaces: Mutex<HashMap<SurfaceId, Option<LoadedImage>>>,
}

impl Part10Engine {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            store,
            surfaces: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self, surface: &SurfaceId) -> bool {
        self.surfaces.lock().contains_key(surface)
    }

    /// The image currently shown on `surface`.
    pub fn rendered(&self, surface: &SurfaceId) -> Option<LoadedImage> {
        self.surfaces.lock().get(surface).cloned().flatten()
    }
}

#[async_trait]
impl ImagingEngine for Part10Engine {
    fn enable(&self, surface: &SurfaceId) {
        self.surfaces.lock().entry(surface.clone()).or_insert(None);
    }

    fn disable(&self, surface: &SurfaceId) {
        self.surfaces.lock().remove(surface);
    }

    async fn load_image(&self, image_id: &ImageId) -> Result<LoadedImage, EngineError> {
        if image_id.scheme() != Some(LOADER_SCHEME) {
            return Err(EngineError::UnknownScheme(image_id.to_string()));
        }
        let url = image_id
            .object_url()
            .ok_or_else(|| EngineError::UnknownScheme(image_id.to_string()))?;
        let blob = self
            .store
            .resolve(url)
            .ok_or_else(|| EngineError::ResourceRevoked(url.to_string()))?;

        let attributes = read_meta(&blob.data)?;
        debug!(%image_id, bytes = blob.len(), "Loaded DICOM header");
        Ok(LoadedImage {
            image_id: image_id.clone(),
            byte_len: blob.len(),
            attributes,
        })
    }

    fn display_image(&self, surface: &SurfaceId, image: &LoadedImage) -> Result<(), EngineError> {
        let mut surfaces = self.surfaces.lock();
        let slot = surfaces
            .get_mut(surface)
            .ok_or_else(|| EngineError::SurfaceNotEnabled(surface.to_string()))?;
        *slot = Some(image.clone());
        Ok(())
    }
}

/// A minimal Part 10 file: preamble, magic, a file meta group and the
/// first dataset element.
#[cfg(test)]
pub(crate) fn sample_file() -> Vec<u8> {
    fn element(out: &mut Vec<u8>, element: u16, vr: &[u8; 2], value: &[u8]) {
        out.extend_from_slice(&0x0002u16.to_le_bytes());
        out.extend_from_slice(&element.to_le_bytes());
        out.extend_from_slice(vr);
        if vr == b"OB" {
            out.extend_from_slice(&[0, 0]);
            out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        } else {
            out.extend_from_slice(&(value.len() as u16).to_le_bytes());
        }
        out.extend_from_slice(value);
    }

    let mut group = Vec::new();
    element(&mut group, 0x0001, b"OB", &[0, 1]);
    element(&mut group, 0x0002, b"UI", b"1.2.840.10008.5.1.4.1.1.2\0");
    element(&mut group, 0x0003, b"UI", b"1.2.3.4.5.6\0");
    element(&mut group, 0x0010, b"UI", b"1.2.840.10008.1.2.1\0");
    element(&mut group, 0x0012, b"UI", b"1.2.3.4\0");
    element(&mut group, 0x0013, b"SH", b"MEDCONSOLE");

    let mut out = vec![0u8; PREAMBLE_LEN];
    out.extend_from_slice(MAGIC);
    element(&mut out, 0x0000, b"UL", &(group.len() as u32).to_le_bytes());
    out.extend_from_slice(&group);
    // First dataset element, outside the meta group.
    out.extend_from_slice(&0x0008u16.to_le_bytes());
    out.extend_from_slice(&0x0016u16.to_le_bytes());
    out.extend_from_slice(b"UI");
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(b"1\0");
    out
}
