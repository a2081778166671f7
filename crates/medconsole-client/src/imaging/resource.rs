//! Transient local resources holding decoded image bytes.
//!
//! A [`ResourceStore`] hands out object URLs for binary blobs, the same way
//! a browser does for `Blob`s. A [`ResourceHandle`] owns one such URL and
//! revokes it exactly once: on [`ResourceHandle::release`], on drop, or
//! after a grace delay via [`ResourceHandle::release_after`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const DICOM_MIME: &str = "application/dicom";

/// Scheme prefix the imaging engine uses to pick its loader.
pub const LOADER_SCHEME: &str = "wadouri";

const OBJECT_URL_PREFIX: &str = "blob:medconsole/";

#[derive(Debug, Clone)]
pub struct Blob {
    pub mime: String,
    pub data: Arc<[u8]>,
}

impl Blob {
    pub fn new(mime: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

pub trait ResourceStore: Send + Sync {
    fn create_object_url(&self, blob: Blob) -> String;

    fn resolve(&self, url: &str) -> Option<Blob>;

    /// Returns whether the URL was still live.
    fn revoke_object_url(&self, url: &str) -> bool;

    fn live_count(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    blobs: Mutex<HashMap<String, Blob>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceStore for MemoryResourceStore {
    fn create_object_url(&self, blob: Blob) -> String {
        let url = format!("{OBJECT_URL_PREFIX}{}", Uuid::new_v4());
        self.blobs.lock().insert(url.clone(), blob);
        url
    }

    fn resolve(&self, url: &str) -> Option<Blob> {
        self.blobs.lock().get(url).cloned()
    }

    fn revoke_object_url(&self, url: &str) -> bool {
        self.blobs.lock().remove(url).is_some()
    }

    fn live_count(&self) -> usize {
        self.blobs.lock().len()
    }
}

/// Loader-scheme identifier, `wadouri:<object-url>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(String);

impl ImageId {
    pub fn for_object_url(url: &str) -> Self {
        Self(format!("{LOADER_SCHEME}:{url}"))
    }

    /// Wraps an identifier produced elsewhere.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn scheme(&self) -> Option<&str> {
        self.0.split_once(':').map(|(scheme, _)| scheme)
    }

    /// The object URL behind a `wadouri:` id.
    pub fn object_url(&self) -> Option<&str> {
        self.0
            .strip_prefix(LOADER_SCHEME)
            .and_then(|rest| rest.strip_prefix(':'))
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct HandleInner {
    store: Arc<dyn ResourceStore>,
    url: String,
    image_id: ImageId,
    byte_len: usize,
    released: AtomicBool,
}

impl HandleInner {
    fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        let revoked = self.store.revoke_object_url(&self.url);
        debug!(image_id = %self.image_id, revoked, "Released image resource");
        revoked
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        // Covers a deferred release whose task never ran to completion.
        self.release();
    }
}

/// Owner of one decoded resource.
pub struct ResourceHandle {
    inner: Arc<HandleInner>,
    deferred: bool,
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("image_id", &self.inner.image_id)
            .field("byte_len", &self.inner.byte_len)
            .field("released", &self.is_released())
            .finish()
    }
}

impl ResourceHandle {
    /// Registers `blob` with the store and takes ownership of its URL.
    pub fn allocate(store: &Arc<dyn ResourceStore>, blob: Blob) -> Self {
        let byte_len = blob.len();
        let url = store.create_object_url(blob);
        let image_id = ImageId::for_object_url(&url);
        Self {
            inner: Arc::new(HandleInner {
                store: Arc::clone(store),
                url,
                image_id,
                byte_len,
                released: AtomicBool::new(false),
            }),
            deferred: false,
        }
    }

    pub fn image_id(&self) -> &ImageId {
        &self.inner.image_id
    }

    pub fn object_url(&self) -> &str {
        &self.inner.url
    }

    pub fn byte_len(&self) -> usize {
        self.inner.byte_len
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    /// Revokes the object URL. Later calls do nothing.
    pub fn release(&self) {
        self.inner.release();
    }

    /// Releases once `grace` has elapsed, leaving the resource readable by
    /// a load that may still be in flight. Zero grace, or no running tokio
    /// runtime, releases immediately.
    pub fn release_after(mut self, grace: Duration) {
        let inner = Arc::clone(&self.inner);
        self.deferred = true;
        drop(self);

        if grace.is_zero() {
            inner.release();
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(grace).await;
                    inner.release();
                });
            }
            Err(_) => {
                inner.release();
            }
        }
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        if !self.deferred {
            self.inner.release();
        }
    }
}

/// Releases the handle, if any. Safe on handles that were already released.
pub fn release_resource(handle: Option<&ResourceHandle>) {
    if let Some(handle) = handle {
        handle.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<dyn ResourceStore> {
        Arc::new(MemoryResourceStore::new())
    }

    fn blob() -> Blob {
        Blob::new(DICOM_MIME, vec![1u8, 2, 3])
    }

    #[test]
    fn test_image_id_shape() {
        let store = store();
        let handle = ResourceHandle::allocate(&store, blob());
        assert!(handle.image_id().as_str().starts_with("wadouri:blob:medconsole/"));
        assert_eq!(handle.image_id().scheme(), Some("wadouri"));
        assert_eq!(handle.image_id().object_url(), Some(handle.object_url()));
        assert_eq!(store.resolve(handle.object_url()).unwrap().len(), 3);
    }

    #[test]
    fn test_release_is_idempotent() {
        let store = store();
        let handle = ResourceHandle::allocate(&store, blob());
        handle.release();
        handle.release();
        release_resource(Some(&handle));
        release_resource(None);
        assert!(handle.is_released());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_drop_releases() {
        let store = store();
        {
            let _handle = ResourceHandle::allocate(&store, blob());
            assert_eq!(store.live_count(), 1);
        }
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_release_after_without_runtime_is_immediate() {
        let store = store();
        let handle = ResourceHandle::allocate(&store, blob());
        handle.release_after(Duration::from_secs(10));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_pending_release_survives_runtime_shutdown() {
        let store = store();
        let handle = ResourceHandle::allocate(&store, blob());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async {
            handle.release_after(Duration::from_secs(10));
        });
        assert_eq!(store.live_count(), 1);

        drop(runtime);
        assert_eq!(store.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_after_waits_for_grace() {
        let store = store();
        let handle = ResourceHandle::allocate(&store, blob());
        handle.release_after(Duration::from_secs(10));
        assert_eq!(store.live_count(), 1);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(store.live_count(), 0);
    }
}
