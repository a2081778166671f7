//! DICOM panel behaviour: fetch, decode, attach and the upload round trip.

mod common;

use std::io::Write as _;
use std::time::Duration;

use medconsole_client::panel::{
    MISSING_PAYLOAD, PREVIEW_UNAVAILABLE, UPLOAD_FORBIDDEN, UPLOAD_SUCCEEDED, VIEW_FAILED,
    VIEW_FORBIDDEN, WRONG_EXTENSION,
};
use medconsole_client::{PanelState, PanelView, Severity, ViewState};
use medconsole_core::{HospitalId, ImagingFile};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hid(raw: &str) -> HospitalId {
    HospitalId::parse(raw).unwrap()
}

fn dcm_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".dcm").tempfile().unwrap();
    file.write_all(&common::sample_dicom()).unwrap();
    file
}

#[tokio::test]
async fn missing_file_shows_upload_prompt_without_banner() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasFile": false})))
        .mount(&server)
        .await;

    let panel = h
        .console
        .dicom_panel(common::engine(&h.console), common::surface());
    let state = panel.open(hid("7")).await;
    assert_eq!(state.view, PanelView::UploadPrompt);
    assert!(state.banner.is_none());
    assert_eq!(panel.viewer().state(), ViewState::Idle);
}

#[tokio::test]
async fn not_found_is_an_empty_state() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let record = h.console.dicom.fetch_metadata(&hid("7")).await.unwrap();
    assert_eq!(record.file, ImagingFile::Missing);
}

#[tokio::test]
async fn stored_file_is_decoded_and_displayed() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hasFile": true,
            "hospitalCode": "SM-01",
            "dicomId": 42,
            "dicomFileBase64": format!("data:application/dicom;base64,{}", common::sample_dicom_base64()),
            "patientDetails": {"patientName": "DOE^JANE", "patientId": "P-1"}
        })))
        .mount(&server)
        .await;

    let engine = common::engine(&h.console);
    let panel = h.console.dicom_panel(engine.clone(), common::surface());
    let state = panel.open(hid("7")).await;

    let PanelView::Viewing(record) = &state.view else {
        panic!("expected viewing state, got {:?}", state.view);
    };
    assert_eq!(record.stored().unwrap().dicom_id.as_deref(), Some("42"));
    assert!(state.banner.is_none());

    let ViewState::Displayed(image) = panel.viewer().state() else {
        panic!("expected displayed image");
    };
    assert!(image.image_id.as_str().starts_with("wadouri:"));
    assert_eq!(
        image.attributes.get("Transfer Syntax").map(String::as_str),
        Some("Explicit VR Little Endian")
    );
    assert!(engine.rendered(&common::surface()).is_some());
    assert_eq!(h.console.resources().live_count(), 1);

    panel.close();
    assert_eq!(panel.state().view, PanelView::Closed);
    assert_eq!(h.console.resources().live_count(), 0);
}

#[tokio::test]
async fn stored_file_without_payload_warns() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasFile": true})))
        .mount(&server)
        .await;

    let panel = h
        .console
        .dicom_panel(common::engine(&h.console), common::surface());
    let state = panel.open(hid("7")).await;
    assert!(matches!(state.view, PanelView::Viewing(_)));
    let banner = state.banner.unwrap();
    assert_eq!(banner.severity, Severity::Warning);
    assert_eq!(banner.text, MISSING_PAYLOAD);
}

#[tokio::test]
async fn short_payload_fails_in_the_viewer_only() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"hasFile": true, "dicomFileBase64": "AAAA"})),
        )
        .mount(&server)
        .await;

    let panel = h
        .console
        .dicom_panel(common::engine(&h.console), common::surface());
    let state = panel.open(hid("7")).await;
    assert!(matches!(state.view, PanelView::Viewing(_)));
    assert!(state.banner.is_none());
    assert!(matches!(panel.viewer().state(), ViewState::LoadFailed { .. }));
    assert_eq!(h.console.resources().live_count(), 0);
}

#[tokio::test]
async fn fetch_errors_map_to_banners() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/1/dicom"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hospital/2/dicom"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let panel = h
        .console
        .dicom_panel(common::engine(&h.console), common::surface());

    let forbidden = panel.open(hid("1")).await;
    assert_eq!(forbidden.view, PanelView::Failed);
    assert_eq!(forbidden.banner.unwrap().text, VIEW_FORBIDDEN);

    let failed = panel.open(hid("2")).await;
    assert_eq!(failed.banner.unwrap().text, VIEW_FAILED);
}

#[tokio::test]
async fn upload_then_refetch_shows_new_file() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasFile": false})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hospital/7/dicom"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hospitalCode": "SM-01"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hasFile": true,
            "dicomFileBase64": common::sample_dicom_base64()
        })))
        .mount(&server)
        .await;

    let panel = h
        .console
        .dicom_panel(common::engine(&h.console), common::surface());
    assert_eq!(panel.open(hid("7")).await.view, PanelView::UploadPrompt);

    let file = dcm_file();
    let state = panel.upload(file.path()).await;
    assert!(!state.uploading);
    assert!(matches!(state.view, PanelView::Viewing(_)));
    let banner = state.banner.unwrap();
    assert_eq!(banner.severity, Severity::Success);
    assert_eq!(banner.text, UPLOAD_SUCCEEDED);
    assert!(matches!(panel.viewer().state(), ViewState::Displayed(_)));
}

#[tokio::test]
async fn upload_ok_refetch_failed_keeps_file_and_warns() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasFile": false})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hospitalCode": "SM-01",
            "detailedResponse": {"patientId": "P-9", "patientName": "DOE^JANE"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let panel = h
        .console
        .dicom_panel(common::engine(&h.console), common::surface());
    panel.open(hid("7")).await;

    let file = dcm_file();
    let state = panel.upload(file.path()).await;

    let PanelView::Viewing(record) = &state.view else {
        panic!("expected viewing state, got {:?}", state.view);
    };
    let stored = record.stored().unwrap();
    assert_eq!(stored.hospital_code.as_deref(), Some("SM-01"));
    assert_eq!(stored.dicom_id.as_deref(), Some("P-9"));
    assert!(stored.payload.is_none());

    let banner = state.banner.unwrap();
    assert_eq!(banner.severity, Severity::Warning);
    assert_eq!(banner.text, PREVIEW_UNAVAILABLE);
}

#[tokio::test]
async fn upload_rejects_wrong_extension_before_sending() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasFile": false})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let panel = h
        .console
        .dicom_panel(common::engine(&h.console), common::surface());
    panel.open(hid("7")).await;

    let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    let state = panel.upload(file.path()).await;
    assert_eq!(state.view, PanelView::UploadPrompt);
    assert_eq!(state.banner.unwrap().text, WRONG_EXTENSION);
}

#[tokio::test]
async fn forbidden_upload_uses_upload_wording() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasFile": false})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let panel = h
        .console
        .dicom_panel(common::engine(&h.console), common::surface());
    panel.open(hid("7")).await;

    let file = dcm_file();
    let state = panel.upload(file.path()).await;
    assert!(!state.uploading);
    assert_eq!(state.view, PanelView::UploadPrompt);
    assert_eq!(state.banner.unwrap().text, UPLOAD_FORBIDDEN);
}

#[tokio::test]
async fn switching_hospitals_discards_the_slower_response() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/1/dicom"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "hasFile": true,
                    "dicomFileBase64": common::sample_dicom_base64()
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hospital/2/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasFile": false})))
        .mount(&server)
        .await;

    let panel = h
        .console
        .dicom_panel(common::engine(&h.console), common::surface());
    tokio::join!(panel.open(hid("1")), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        panel.open(hid("2")).await
    });

    let state = panel.state();
    assert_eq!(state.hospital_id, Some(hid("2")));
    assert_eq!(state.view, PanelView::UploadPrompt);
    assert!(state.banner.is_none());
    assert_eq!(panel.viewer().state(), ViewState::Idle);
    assert_eq!(h.console.resources().live_count(), 0);
}

#[tokio::test]
async fn closing_during_upload_discards_the_refetch() {
    let server = MockServer::start().await;
    let h = common::harness(&server);
    h.session.set_token(Some("tok"));

    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasFile": false})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hospital/7/dicom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hospitalCode": "SM-01"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hospital/7/dicom"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "hasFile": true,
                    "dicomFileBase64": common::sample_dicom_base64()
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let panel = h
        .console
        .dicom_panel(common::engine(&h.console), common::surface());
    panel.open(hid("7")).await;

    let file = dcm_file();
    tokio::join!(panel.upload(file.path()), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        panel.close();
    });

    assert_eq!(panel.state(), PanelState::default());
    assert_eq!(panel.viewer().state(), ViewState::Idle);
    assert_eq!(h.console.resources().live_count(), 0);
}
