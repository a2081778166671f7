use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use colored::Colorize;
use medconsole_client::{Console, HospitalFilter, HospitalSearch, SearchKind};
use medconsole_core::{Contact, ContactType, HospitalId, HospitalPayload};

use super::report;
use crate::cli::{
    DeleteArgs, HospitalFormArgs, ListArgs, OutputFormat, SearchBy, UpdateArgs,
};
use crate::output::{print_hospital, print_hospitals, print_success};

pub async fn list(console: &Console, args: &ListArgs, format: OutputFormat) -> Result<()> {
    let filter = match &args.term {
        Some(term) => {
            let kind = match args.by {
                SearchBy::Name => SearchKind::Name,
                SearchBy::Code => SearchKind::Code,
            };
            HospitalSearch::new(kind, term.as_str()).filter()
        }
        None => HospitalFilter::all(),
    };
    let hospitals = console.hospitals.list(&filter).await?;
    print_hospitals(&hospitals, format);
    Ok(())
}

pub async fn create(console: &Console, form: &HospitalFormArgs, format: OutputFormat) -> Result<()> {
    let payload = apply_form(HospitalPayload::default(), form);
    let created = console.hospitals.create(&payload).await.map_err(report)?;
    print_success(&format!(
        "Registered {} ({})",
        created.name.cyan(),
        created.id.to_string().cyan()
    ));
    print_hospital(&created, format);
    Ok(())
}

pub async fn update(console: &Console, args: &UpdateArgs, format: OutputFormat) -> Result<()> {
    let id = HospitalId::parse(&args.id)?;
    let current = console.hospitals.find(&id).await?;
    let payload = apply_form(HospitalPayload::from_hospital(&current), &args.form);
    let updated = console
        .hospitals
        .update(&id, &payload)
        .await
        .map_err(report)?;
    print_success(&format!("Updated {}", updated.name.cyan()));
    print_hospital(&updated, format);
    Ok(())
}

pub async fn delete(console: &Console, args: &DeleteArgs) -> Result<()> {
    let id = HospitalId::parse(&args.id)?;
    if !args.yes && !confirm(&format!("Delete hospital {id}?"))? {
        println!("Cancelled");
        return Ok(());
    }
    console.hospitals.remove(&id).await?;
    print_success(&format!("Deleted hospital {}", id.to_string().cyan()));
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Overlays the flags that were given onto `payload`.
fn apply_form(mut payload: HospitalPayload, form: &HospitalFormArgs) -> HospitalPayload {
    if let Some(name) = &form.name {
        payload.name = name.clone();
    }
    if let Some(address) = &form.address {
        payload.address = address.clone();
    }
    apply_contact(
        &mut payload,
        ContactType::Primary,
        [
            &form.first_contact_name,
            &form.first_contact_email,
            &form.first_contact_number,
        ],
    );
    apply_contact(
        &mut payload,
        ContactType::Secondary,
        [
            &form.second_contact_name,
            &form.second_contact_email,
            &form.second_contact_number,
        ],
    );
    payload
}

fn apply_contact(
    payload: &mut HospitalPayload,
    contact_type: ContactType,
    [name, email, number]: [&Option<String>; 3],
) {
    if name.is_none() && email.is_none() && number.is_none() {
        return;
    }
    let index = match payload
        .contacts
        .iter()
        .position(|c| c.contact_type == contact_type)
    {
        Some(index) => index,
        None => {
            payload
                .contacts
                .push(Contact::new(contact_type, "", "", ""));
            payload.contacts.len() - 1
        }
    };
    let contact = &mut payload.contacts[index];
    if let Some(name) = name {
        contact.name = name.clone();
    }
    if let Some(email) = email {
        contact.email = email.clone();
    }
    if let Some(number) = number {
        contact.phone_number = number.clone();
    }
}
