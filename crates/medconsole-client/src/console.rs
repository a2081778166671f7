use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::ClientConfig;
use crate::dicom::DicomTransfer;
use crate::error::Result;
use crate::gateway::ApiClient;
use crate::hospitals::HospitalDirectory;
use crate::imaging::{ImagingEngine, MemoryResourceStore, ResourceStore, SurfaceId, Viewer};
use crate::navigation::Navigator;
use crate::panel::DicomPanel;
use crate::session::SessionStore;

/// Every client service, wired to one session and one gateway.
pub struct Console {
    config: ClientConfig,
    api: Arc<ApiClient>,
    resources: Arc<dyn ResourceStore>,
    pub auth: AuthService,
    pub hospitals: HospitalDirectory,
    pub dicom: DicomTransfer,
}

impl Console {
    pub fn new(
        config: ClientConfig,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config, session, navigator)?);
        Ok(Self {
            auth: AuthService::new(api.clone()),
            hospitals: HospitalDirectory::new(api.clone()),
            dicom: DicomTransfer::new(api.clone()),
            resources: Arc::new(MemoryResourceStore::new()),
            config,
            api,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.api.session()
    }

    pub fn resources(&self) -> &Arc<dyn ResourceStore> {
        &self.resources
    }

    pub fn viewer(&self, engine: Arc<dyn ImagingEngine>, surface: SurfaceId) -> Viewer {
        Viewer::new(engine, surface, self.config.release_grace)
    }

    /// A DICOM panel rendering onto `surface` through `engine`.
    pub fn dicom_panel(&self, engine: Arc<dyn ImagingEngine>, surface: SurfaceId) -> DicomPanel {
        DicomPanel::new(
            self.dicom.clone(),
            self.resources.clone(),
            self.viewer(engine, surface),
        )
    }
}
