//! Hospital directory records and write payloads.
//!
//! The read shape tolerates the field spellings the backend has used over
//! time; the write shape is the one the backend accepts today.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use time::Date;
use time::macros::format_description;

use crate::error::CoreError;
use crate::id::HospitalId;

/// Role of a hospital contact. A hospital has at most one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactType {
    #[serde(rename = "PRIMARY", alias = "Primary", alias = "primary")]
    Primary,
    #[serde(rename = "SECONDARY", alias = "Secondary", alias = "secondary")]
    Secondary,
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub contact_type: ContactType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, alias = "contactNumber", deserialize_with = "null_as_empty")]
    pub phone_number: String,
}

impl Contact {
    pub fn new(
        contact_type: ContactType,
        name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            contact_type,
            name: name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
        }
    }

    /// True when every field is blank; such contacts are not sent.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
            && self.email.trim().is_empty()
            && self.phone_number.trim().is_empty()
    }
}

/// A hospital record as returned by the directory endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "HospitalWire")]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    pub hospital_code: Option<String>,
    pub address: Option<String>,
    pub registration_date: Option<String>,
    pub contacts: Vec<Contact>,
    pub has_imaging_file: bool,
}

impl Hospital {
    pub fn contact(&self, contact_type: ContactType) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.contact_type == contact_type)
    }

    /// Calendar date of registration, when the backend sent one.
    ///
    /// Accepts a plain `YYYY-MM-DD` or a timestamp starting with one.
    pub fn registered_on(&self) -> Result<Option<Date>, CoreError> {
        let Some(raw) = self.registration_date.as_deref() else {
            return Ok(None);
        };
        let day = raw.get(..10).unwrap_or(raw);
        Date::parse(day, format_description!("[year]-[month]-[day]"))
            .map(Some)
            .map_err(|_| CoreError::invalid_date(raw))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HospitalWire {
    #[serde(default)]
    id: Option<HospitalId>,
    #[serde(default)]
    hospital_id: Option<HospitalId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    hospital_name: Option<String>,
    #[serde(default)]
    hospital_code: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    hospital_address: Option<String>,
    #[serde(default)]
    registration_date: Option<String>,
    #[serde(default)]
    contacts: Option<Vec<Contact>>,
    #[serde(default)]
    first_contact: Option<LegacyContact>,
    #[serde(default)]
    second_contact: Option<LegacyContact>,
    #[serde(default, alias = "hasDicom", alias = "hasFile")]
    has_imaging_file: Option<bool>,
}

impl TryFrom<HospitalWire> for Hospital {
    type Error = CoreError;

    fn try_from(wire: HospitalWire) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .or(wire.hospital_id)
            .ok_or_else(|| CoreError::unexpected_shape("hospital record without id"))?;

        let contacts = match wire.contacts {
            Some(contacts) => contacts,
            None => [
                (ContactType::Primary, wire.first_contact),
                (ContactType::Secondary, wire.second_contact),
            ]
            .into_iter()
            .filter_map(|(kind, legacy)| legacy.map(|l| l.into_contact(kind)))
            .filter(|c| !c.is_blank())
            .collect(),
        };

        Ok(Self {
            id,
            name: wire.name.or(wire.hospital_name).unwrap_or_default(),
            hospital_code: wire.hospital_code,
            address: wire.address.or(wire.hospital_address),
            registration_date: wire.registration_date,
            contacts,
            has_imaging_file: wire.has_imaging_file.unwrap_or(false),
        })
    }
}

/// `firstContact` / `secondContact` object shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyContact {
    #[serde(default, deserialize_with = "null_as_empty")]
    name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    email: String,
    #[serde(default, alias = "phoneNumber", deserialize_with = "null_as_empty")]
    contact_number: String,
}

impl LegacyContact {
    fn into_contact(self, contact_type: ContactType) -> Contact {
        Contact::new(contact_type, self.name, self.email, self.contact_number)
    }

    fn from_contact(contact: &Contact) -> Self {
        Self {
            name: contact.name.trim().to_string(),
            email: contact.email.trim().to_string(),
            contact_number: contact.phone_number.trim().to_string(),
        }
    }
}

/// Body for create and update requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalPayload {
    #[serde(alias = "hospitalName")]
    pub name: String,
    #[serde(alias = "hospitalAddress")]
    pub address: String,
    #[serde(default)]
    pub contacts: Vec<Contact>,
}

impl HospitalPayload {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            contacts: Vec::new(),
        }
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contacts.push(contact);
        self
    }

    /// Pre-fills an edit form from an existing record.
    pub fn from_hospital(hospital: &Hospital) -> Self {
        Self {
            name: hospital.name.clone(),
            address: hospital.address.clone().unwrap_or_default(),
            contacts: hospital.contacts.clone(),
        }
    }

    fn contact(&self, contact_type: ContactType) -> Option<LegacyContact> {
        self.contacts
            .iter()
            .find(|c| c.contact_type == contact_type && !c.is_blank())
            .map(LegacyContact::from_contact)
    }
}

impl Serialize for HospitalPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            hospital_name: &'a str,
            hospital_address: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            first_contact: Option<LegacyContact>,
            #[serde(skip_serializing_if = "Option::is_none")]
            second_contact: Option<LegacyContact>,
        }

        Wire {
            hospital_name: self.name.trim(),
            hospital_address: self.address.trim(),
            first_contact: self.contact(ContactType::Primary),
            second_contact: self.contact(ContactType::Secondary),
        }
        .serialize(serializer)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
