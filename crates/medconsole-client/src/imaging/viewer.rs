//! One viewing surface and the resource currently attached to it.
//!
//! Each attach starts a new viewing session identified by a generation
//! number. A session that is superseded while its load is in flight has
//! its result discarded, the engine disabled once, and its resource
//! released after the configured grace delay.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::decode::DecodeError;
use super::engine::{ImagingEngine, LoadedImage, SurfaceId};
use super::resource::{ImageId, ResourceHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Loading { image_id: ImageId },
    Displayed(LoadedImage),
    LoadFailed { message: String },
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    Displayed(LoadedImage),
    Failed(String),
    /// A newer attach or a clear happened while loading.
    Superseded,
}

struct ViewSession {
    handle: Option<ResourceHandle>,
    enabled: bool,
    loading: bool,
}

#[derive(Default)]
struct ViewerInner {
    generation: u64,
    session: Option<ViewSession>,
}

pub struct Viewer {
    engine: Arc<dyn ImagingEngine>,
    surface: SurfaceId,
    grace: Duration,
    inner: Mutex<ViewerInner>,
    state: watch::Sender<ViewState>,
}

impl Viewer {
    pub fn new(engine: Arc<dyn ImagingEngine>, surface: SurfaceId, grace: Duration) -> Self {
        let (state, _) = watch::channel(ViewState::Idle);
        Self {
            engine,
            surface,
            grace,
            inner: Mutex::new(ViewerInner::default()),
            state,
        }
    }

    pub fn surface(&self) -> &SurfaceId {
        &self.surface
    }

    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Image id of the attached resource, while it is held.
    pub fn image_id(&self) -> Option<ImageId> {
        let inner = self.inner.lock();
        inner
            .session
            .as_ref()
            .and_then(|s| s.handle.as_ref())
            .map(|h| h.image_id().clone())
    }

    /// Shows the image behind `handle`, replacing whatever the surface held.
    pub async fn attach(&self, handle: ResourceHandle) -> AttachOutcome {
        let image_id = handle.image_id().clone();
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            if let Some(previous) = inner.session.take() {
                self.teardown(previous);
            }
            self.engine.enable(&self.surface);
            inner.session = Some(ViewSession {
                handle: Some(handle),
                enabled: true,
                loading: true,
            });
            self.state.send_replace(ViewState::Loading {
                image_id: image_id.clone(),
            });
            inner.generation
        };

        let loaded = self.engine.load_image(&image_id).await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(%image_id, "Discarding superseded image load");
            return AttachOutcome::Superseded;
        }
        let shown = loaded.and_then(|image| {
            self.engine
                .display_image(&self.surface, &image)
                .map(|()| image)
        });

        let session = inner.session.as_mut();
        match shown {
            Ok(image) => {
                if let Some(session) = session {
                    session.loading = false;
                }
                self.state.send_replace(ViewState::Displayed(image.clone()));
                AttachOutcome::Displayed(image)
            }
            Err(e) => {
                warn!(%image_id, error = %e, "Image failed to load");
                if let Some(session) = session {
                    session.loading = false;
                    if let Some(handle) = session.handle.take() {
                        handle.release();
                    }
                }
                let message = e.to_string();
                self.state.send_replace(ViewState::LoadFailed {
                    message: message.clone(),
                });
                AttachOutcome::Failed(message)
            }
        }
    }

    /// Tears down the current session and reports a payload that could not
    /// be decoded.
    pub fn fail_decode(&self, error: &DecodeError) {
        self.reset(ViewState::LoadFailed {
            message: error.to_string(),
        });
    }

    /// Tears down the current session; the surface goes back to idle.
    pub fn clear(&self) {
        self.reset(ViewState::Idle);
    }

    fn reset(&self, next: ViewState) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        if let Some(previous) = inner.session.take() {
            self.teardown(previous);
        }
        self.state.send_replace(next);
    }

    fn teardown(&self, session: ViewSession) {
        if session.enabled {
            self.engine.disable(&self.surface);
        }
        if let Some(handle) = session.handle {
            if session.loading {
                handle.release_after(self.grace);
            } else {
                handle.release();
            }
        }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        if let Some(session) = self.inner.get_mut().session.take() {
            self.teardown(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use indexmap::IndexMap;
    use tokio::sync::Notify;

    use super::*;
    use crate::imaging::decode::decode_payload;
    use crate::imaging::engine::EngineError;
    use crate::imaging::part10::{Part10Engine, sample_file};
    use crate::imaging::resource::{Blob, DICOM_MIME, MemoryResourceStore, ResourceStore};

    /// Engine whose loads block until the test opens their gate.
    #[derive(Default)]
    struct GatedEngine {
        gates: parking_lot::Mutex<HashMap<ImageId, Arc<Notify>>>,
        disabled: AtomicUsize,
        displayed: parking_lot::Mutex<Vec<ImageId>>,
    }

    impl GatedEngine {
        fn gate(&self, image_id: &ImageId) -> Arc<Notify> {
            self.gates.lock().entry(image_id.clone()).or_default().clone()
        }

        fn open(&self, image_id: &ImageId) {
            self.gate(image_id).notify_one();
        }
    }

    #[async_trait]
    impl ImagingEngine for GatedEngine {
        fn enable(&self, _surface: &SurfaceId) {}

        fn disable(&self, _surface: &SurfaceId) {
            self.disabled.fetch_add(1, Ordering::SeqCst);
        }

        async fn load_image(&self, image_id: &ImageId) -> Result<LoadedImage, EngineError> {
            self.gate(image_id).notified().await;
            Ok(LoadedImage {
                image_id: image_id.clone(),
                byte_len: 0,
                attributes: IndexMap::new(),
            })
        }

        fn display_image(&self, _surface: &SurfaceId, image: &LoadedImage) -> Result<(), EngineError> {
            self.displayed.lock().push(image.image_id.clone());
            Ok(())
        }
    }

    fn blob() -> Blob {
        Blob::new(DICOM_MIME, sample_file())
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_attach_supersedes_first() {
        let store: Arc<dyn ResourceStore> = Arc::new(MemoryResourceStore::new());
        let engine = Arc::new(GatedEngine::default());
        let viewer = Viewer::new(engine.clone(), SurfaceId::new("main"), Duration::from_secs(10));

        let first = ResourceHandle::allocate(&store, blob());
        let second = ResourceHandle::allocate(&store, blob());
        let first_id = first.image_id().clone();
        let second_id = second.image_id().clone();

        let (first_outcome, second_outcome, ()) = tokio::join!(
            viewer.attach(first),
            async {
                tokio::task::yield_now().await;
                viewer.attach(second).await
            },
            async {
                for _ in 0..4 {
                    tokio::task::yield_now().await;
                }
                engine.open(&second_id);
                engine.open(&first_id);
            },
        );

        assert_eq!(first_outcome, AttachOutcome::Superseded);
        assert!(matches!(second_outcome, AttachOutcome::Displayed(ref image) if image.image_id == second_id));
        assert_eq!(*engine.displayed.lock(), vec![second_id.clone()]);
        assert_eq!(engine.disabled.load(Ordering::SeqCst), 1);
        assert!(matches!(viewer.state(), ViewState::Displayed(ref image) if image.image_id == second_id));

        // The superseded resource outlives its grace delay, then goes away.
        assert_eq!(store.live_count(), 2);
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(store.live_count(), 1);
    }

    #[tokio::test]
    async fn test_attach_displays_part10() {
        let store: Arc<dyn ResourceStore> = Arc::new(MemoryResourceStore::new());
        let engine = Arc::new(Part10Engine::new(store.clone()));
        let surface = SurfaceId::new("main");
        let viewer = Viewer::new(engine.clone(), surface.clone(), Duration::ZERO);
        let mut states = viewer.subscribe();

        let handle = ResourceHandle::allocate(&store, blob());
        let outcome = viewer.attach(handle).await;
        assert!(matches!(outcome, AttachOutcome::Displayed(_)));
        assert!(states.has_changed().unwrap());
        assert!(matches!(*states.borrow_and_update(), ViewState::Displayed(_)));
        assert!(engine.rendered(&surface).is_some());

        viewer.clear();
        assert_eq!(viewer.state(), ViewState::Idle);
        assert!(!engine.is_enabled(&surface));
        assert_eq!(store.live_count(), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_becomes_load_failed() {
        let store: Arc<dyn ResourceStore> = Arc::new(MemoryResourceStore::new());
        let engine = Arc::new(Part10Engine::new(store.clone()));
        let viewer = Viewer::new(engine, SurfaceId::new("main"), Duration::ZERO);

        let handle = ResourceHandle::allocate(&store, Blob::new(DICOM_MIME, vec![0u8; 200]));
        let outcome = viewer.attach(handle).await;
        assert!(matches!(outcome, AttachOutcome::Failed(ref m) if m.contains("DICM")));
        assert!(matches!(viewer.state(), ViewState::LoadFailed { .. }));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_decode_failure_is_reported() {
        let store: Arc<dyn ResourceStore> = Arc::new(MemoryResourceStore::new());
        let engine = Arc::new(Part10Engine::new(store.clone()));
        let viewer = Viewer::new(engine, SurfaceId::new("main"), Duration::ZERO);

        let err = decode_payload("abc", &store).unwrap_err();
        viewer.fail_decode(&err);
        assert!(matches!(viewer.state(), ViewState::LoadFailed { ref message } if message.contains("too short")));
    }

    #[tokio::test]
    async fn test_drop_releases_resource() {
        let store: Arc<dyn ResourceStore> = Arc::new(MemoryResourceStore::new());
        let engine = Arc::new(Part10Engine::new(store.clone()));
        {
            let viewer = Viewer::new(engine, SurfaceId::new("main"), Duration::ZERO);
            viewer.attach(ResourceHandle::allocate(&store, blob())).await;
            assert_eq!(store.live_count(), 1);
        }
        assert_eq!(store.live_count(), 0);
    }
}
