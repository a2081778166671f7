use colored::Colorize;
use medconsole_client::{Banner, PanelState, PanelView, Severity, ViewState};
use medconsole_core::{ContactType, ErrorCategory, Hospital, ImagingRecord, ValidationErrors};
use serde_json::{Value, json};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Follow-up suggestion printed under an error of `category`.
pub fn hint_for(category: ErrorCategory) -> Option<&'static str> {
    match category {
        ErrorCategory::Authentication => Some("Run `medconsole login` to sign in."),
        ErrorCategory::Permission => Some("Your account is not allowed to do this."),
        ErrorCategory::Network => {
            Some("Check that the server is reachable (see `medconsole config show`).")
        }
        ErrorCategory::Configuration => {
            Some("Check the server URL with `medconsole config set server <url>`.")
        }
        _ => None,
    }
}

pub fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

pub fn print_banner(banner: &Banner) {
    match banner.severity {
        Severity::Success => print_success(&banner.text),
        Severity::Warning => print_warning(&banner.text),
        Severity::Error => print_error(&banner.text),
    }
}

pub fn print_validation(errors: &ValidationErrors) {
    print_error("Please fix the following fields:");
    for (field, message) in errors.iter() {
        eprintln!("  {} {}", format!("{field}:").cyan(), message);
    }
}

fn registered(hospital: &Hospital) -> String {
    match hospital.registered_on() {
        Ok(Some(date)) => date.to_string(),
        Ok(None) => "-".to_string(),
        Err(_) => hospital.registration_date.clone().unwrap_or_default(),
    }
}

pub fn print_hospitals(hospitals: &[Hospital], format: OutputFormat) {
    if format == OutputFormat::Json {
        print_json(&serde_json::to_value(hospitals).unwrap_or(Value::Null));
        return;
    }
    if hospitals.is_empty() {
        println!("No hospitals found.");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Code", "Address", "Registered", "Primary Contact", "DICOM"]);
    for hospital in hospitals {
        let contact = hospital
            .contact(ContactType::Primary)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "-".to_string());
        builder.push_record([
            hospital.id.to_string(),
            hospital.name.clone(),
            hospital.hospital_code.clone().unwrap_or_else(|| "-".to_string()),
            hospital.address.clone().unwrap_or_else(|| "-".to_string()),
            registered(hospital),
            contact,
            if hospital.has_imaging_file { "yes" } else { "no" }.to_string(),
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
    let count = hospitals.len();
    println!(
        "({count}) Registered Hospital{}",
        if count == 1 { "" } else { "s" }
    );
}

pub fn print_hospital(hospital: &Hospital, format: OutputFormat) {
    if format == OutputFormat::Json {
        print_json(&serde_json::to_value(hospital).unwrap_or(Value::Null));
        return;
    }

    println!("{} {} ({})", "Hospital:".cyan(), hospital.name, hospital.id);
    let mut builder = Builder::default();
    builder.push_record([
        "Code".to_string(),
        hospital.hospital_code.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    builder.push_record([
        "Address".to_string(),
        hospital.address.clone().unwrap_or_else(|| "-".to_string()),
    ]);
    builder.push_record(["Registered".to_string(), registered(hospital)]);
    for contact in &hospital.contacts {
        builder.push_record([
            format!("{} contact", contact.contact_type),
            format!(
                "{} <{}> {}",
                contact.name, contact.email, contact.phone_number
            ),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

fn record_json(record: &ImagingRecord) -> Value {
    match record.stored() {
        Some(stored) => json!({
            "hospitalId": record.hospital_id,
            "hasFile": true,
            "hospitalCode": stored.hospital_code,
            "dicomId": stored.dicom_id,
            "patientDetails": stored.patient,
            "hasPayload": stored.payload.is_some(),
        }),
        None => json!({"hospitalId": record.hospital_id, "hasFile": false}),
    }
}

pub fn print_panel(state: &PanelState, view: &ViewState, format: OutputFormat) {
    if format == OutputFormat::Json {
        let mut value = match &state.view {
            PanelView::Viewing(record) => record_json(record),
            PanelView::UploadPrompt => json!({"hospitalId": state.hospital_id, "hasFile": false}),
            _ => json!({"hospitalId": state.hospital_id}),
        };
        match view {
            ViewState::Displayed(image) => {
                value["header"] = json!(image.attributes);
                value["imageBytes"] = json!(image.byte_len);
            }
            ViewState::LoadFailed { message } => value["previewError"] = json!(message),
            ViewState::Idle | ViewState::Loading { .. } => {}
        }
        if let Some(banner) = &state.banner {
            value["message"] = json!(banner.text);
        }
        print_json(&value);
        return;
    }

    if let Some(banner) = &state.banner {
        print_banner(banner);
    }

    match &state.view {
        PanelView::Viewing(record) => {
            if let Some(stored) = record.stored() {
                print_stored(record, stored);
            }
            match view {
                ViewState::Displayed(image) => {
                    let mut builder = Builder::default();
                    builder.push_record(["Header", "Value"]);
                    for (name, value) in &image.attributes {
                        builder.push_record([name.as_str(), value.as_str()]);
                    }
                    println!("{}", builder.build().with(Style::rounded()));
                    println!("Image size: {} bytes", image.byte_len);
                }
                ViewState::LoadFailed { message } => {
                    print_warning(&format!("Preview unavailable: {message}"));
                }
                ViewState::Idle | ViewState::Loading { .. } => {}
            }
        }
        PanelView::UploadPrompt => {
            let id = state
                .hospital_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "<id>".to_string());
            println!("No DICOM file stored for this hospital.");
            println!(
                "Upload one with: {}",
                format!("medconsole dicom upload {id} <file.dcm>").cyan()
            );
        }
        PanelView::Closed | PanelView::Loading | PanelView::Failed => {}
    }
}

fn print_stored(record: &ImagingRecord, stored: &medconsole_core::StoredImage) {
    println!(
        "{} {}  {} {}",
        "Hospital:".cyan(),
        stored
            .hospital_code
            .clone()
            .unwrap_or_else(|| record.hospital_id.to_string()),
        "DICOM ID:".cyan(),
        stored.dicom_id.as_deref().unwrap_or("N/A")
    );
    let patient = stored.patient.clone().unwrap_or_default();
    let mut builder = Builder::default();
    builder.push_record(["Patient", ""]);
    for (label, value) in patient.rows() {
        builder.push_record([label, value]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use medconsole_client::ClientError;

    #[test]
    fn test_hints_follow_error_category() {
        let expired = ClientError::Unauthorized("expired".into());
        assert_eq!(
            hint_for(expired.category()),
            Some("Run `medconsole login` to sign in.")
        );
        assert!(hint_for(ClientError::NotAuthenticated.category()).is_some());
        assert!(hint_for(ClientError::Conflict("in use".into()).category()).is_none());
    }
}
