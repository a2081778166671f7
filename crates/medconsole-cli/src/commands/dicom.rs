use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use medconsole_client::imaging::decode_bytes;
use medconsole_client::panel::MISSING_PAYLOAD;
use medconsole_client::{Console, DicomPanel, Part10Engine, PanelView, Severity, SurfaceId};
use medconsole_core::HospitalId;

use crate::cli::OutputFormat;
use crate::output::{print_panel, print_success};

fn panel(console: &Console) -> DicomPanel {
    let engine = Arc::new(Part10Engine::new(console.resources().clone()));
    console.dicom_panel(engine, SurfaceId::new("terminal"))
}

pub async fn show(console: &Console, id: &str, format: OutputFormat) -> Result<()> {
    let id = HospitalId::parse(id)?;
    let panel = panel(console);
    let state = panel.open(id).await;
    if state.view == PanelView::Failed {
        let message = state.banner.map(|b| b.text).unwrap_or_default();
        bail!(message);
    }
    print_panel(&state, &panel.viewer().state(), format);
    panel.close();
    Ok(())
}

pub async fn upload(console: &Console, id: &str, file: &Path, format: OutputFormat) -> Result<()> {
    let id = HospitalId::parse(id)?;
    let panel = panel(console);
    let opened = panel.open(id).await;
    if opened.view == PanelView::Failed {
        let message = opened.banner.map(|b| b.text).unwrap_or_default();
        bail!(message);
    }

    println!("Uploading {}...", file.display());
    let state = panel.upload(file).await;
    if let Some(banner) = &state.banner
        && banner.severity == Severity::Error
    {
        bail!(banner.text.clone());
    }
    print_panel(&state, &panel.viewer().state(), format);
    panel.close();
    Ok(())
}

pub async fn export(console: &Console, id: &str, output: Option<&Path>) -> Result<()> {
    let id = HospitalId::parse(id)?;
    let record = console.dicom.fetch_metadata(&id).await?;
    let stored = record
        .stored()
        .with_context(|| format!("No DICOM file stored for hospital {id}"))?;
    let payload = stored.payload.as_deref().context(MISSING_PAYLOAD)?;
    let bytes = decode_bytes(payload)?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => default_output(stored.hospital_code.as_deref(), &id),
    };
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    print_success(&format!(
        "Saved {} bytes to {}",
        bytes.len(),
        path.display().to_string().cyan()
    ));
    Ok(())
}

fn default_output(hospital_code: Option<&str>, id: &HospitalId) -> PathBuf {
    let stem = hospital_code
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| code.replace(['/', '\\'], "_"))
        .unwrap_or_else(|| id.to_string());
    PathBuf::from(format!("{stem}.dcm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_prefers_code() {
        let id = HospitalId::parse("7").unwrap();
        assert_eq!(default_output(Some("SM/01"), &id), PathBuf::from("SM_01.dcm"));
        assert_eq!(default_output(Some("  "), &id), PathBuf::from("7.dcm"));
        assert_eq!(default_output(None, &id), PathBuf::from("7.dcm"));
    }
}
