#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use medconsole_client::{
    ClientConfig, Console, MemoryNavigator, Part10Engine, Route, SessionStore, SurfaceId,
};
use wiremock::MockServer;

pub struct Harness {
    pub console: Console,
    pub session: Arc<SessionStore>,
    pub navigator: Arc<MemoryNavigator>,
}

pub fn harness(server: &MockServer) -> Harness {
    let session = Arc::new(SessionStore::in_memory());
    let navigator = Arc::new(MemoryNavigator::new(Route::Hospitals));
    let config = ClientConfig::new(server.uri()).with_release_grace(std::time::Duration::ZERO);
    let console = Console::new(config, session.clone(), navigator.clone()).unwrap();
    Harness {
        console,
        session,
        navigator,
    }
}

pub fn engine(console: &Console) -> Arc<Part10Engine> {
    Arc::new(Part10Engine::new(console.resources().clone()))
}

pub fn surface() -> SurfaceId {
    SurfaceId::new("dicom-panel")
}

/// Preamble, `DICM` and a file meta group with a transfer syntax.
pub fn sample_dicom() -> Vec<u8> {
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
    element(&mut group, 0x0002, b"UI", b"1.2.840.10008.5.1.4.1.1.7\0");
    element(&mut group, 0x0003, b"UI", b"1.2.3.4\0");
    element(&mut group, 0x0010, b"UI", b"1.2.840.10008.1.2.1\0");
    element(&mut group, 0x0012, b"UI", b"1.2.3.4.5\0");

    let mut out = vec![0u8; 128];
    out.extend_from_slice(b"DICM");
    element(&mut out, 0x0000, b"UL", &(group.len() as u32).to_le_bytes());
    out.extend_from_slice(&group);
    out
}

pub fn sample_dicom_base64() -> String {
    STANDARD.encode(sample_dicom())
}
