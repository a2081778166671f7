//! Hospital directory: search, create, update and delete.

use std::str::FromStr;
use std::sync::Arc;

use medconsole_core::{Hospital, HospitalId, HospitalPayload, validate_hospital};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::gateway::{ApiClient, unwrap_envelope};

const LIST_PATH: &str = "/hospital/getList";
const CREATE_PATH: &str = "/hospital/addHospital";

/// Server-side search terms. Blank terms are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HospitalFilter {
    pub by_name: Option<String>,
    pub by_code: Option<String>,
}

impl HospitalFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            by_name: Some(name.into()),
            by_code: None,
        }
    }

    pub fn by_code(code: impl Into<String>) -> Self {
        Self {
            by_name: None,
            by_code: Some(code.into()),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("hospitalName", self.by_name.as_deref()),
            ("hospitalCode", self.by_code.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, term)| {
            let term = term?.trim();
            (!term.is_empty()).then_some((key, term))
        })
        .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchKind {
    #[default]
    Name,
    Code,
}

impl FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "code" => Ok(Self::Code),
            other => Err(format!("unknown search kind '{other}' (expected name or code)")),
        }
    }
}

/// What the search box holds: one term searched by name or by code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HospitalSearch {
    pub kind: SearchKind,
    pub term: String,
}

impl HospitalSearch {
    pub fn new(kind: SearchKind, term: impl Into<String>) -> Self {
        Self {
            kind,
            term: term.into(),
        }
    }

    pub fn filter(&self) -> HospitalFilter {
        let term = self.term.trim();
        if term.is_empty() {
            return HospitalFilter::all();
        }
        match self.kind {
            SearchKind::Name => HospitalFilter::by_name(term),
            SearchKind::Code => HospitalFilter::by_code(term),
        }
    }
}

pub struct HospitalDirectory {
    api: Arc<ApiClient>,
    cache: RwLock<Option<Vec<Hospital>>>,
}

impl HospitalDirectory {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            cache: RwLock::new(None),
        }
    }

    /// The last list fetched, unless a mutation has happened since.
    pub fn cached(&self) -> Option<Vec<Hospital>> {
        self.cache.read().clone()
    }

    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    pub async fn list(&self, filter: &HospitalFilter) -> Result<Vec<Hospital>> {
        let query = filter.query_pairs();
        let body: Value = self.api.get_json(LIST_PATH, &query).await?;
        let hospitals = match unwrap_envelope(body) {
            Value::Null => Vec::new(),
            value => serde_json::from_value::<Vec<Hospital>>(value)
                .map_err(|e| ClientError::invalid_response(format!("hospital list: {e}")))?,
        };
        debug!(count = hospitals.len(), "Fetched hospitals");
        *self.cache.write() = Some(hospitals.clone());
        Ok(hospitals)
    }

    /// Looks a hospital up in the cached list, fetching it when needed.
    pub async fn find(&self, id: &HospitalId) -> Result<Hospital> {
        let hospitals = match self.cached() {
            Some(hospitals) => hospitals,
            None => self.list(&HospitalFilter::all()).await?,
        };
        hospitals
            .into_iter()
            .find(|h| &h.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("hospital {id}")))
    }

    pub async fn create(&self, payload: &HospitalPayload) -> Result<Hospital> {
        validate_hospital(payload)?;
        let body: Value = self.api.post_json(CREATE_PATH, payload).await?;
        self.invalidate();
        let hospital = parse_hospital(body)?;
        info!(id = %hospital.id, name = %hospital.name, "Hospital created");
        Ok(hospital)
    }

    pub async fn update(&self, id: &HospitalId, payload: &HospitalPayload) -> Result<Hospital> {
        validate_hospital(payload)?;
        let body: Value = self.api.put_json(&format!("/hospital/{id}"), payload).await?;
        self.invalidate();
        let hospital = parse_hospital(body)?;
        info!(%id, "Hospital updated");
        Ok(hospital)
    }

    /// Confirmation is the caller's job.
    pub async fn remove(&self, id: &HospitalId) -> Result<()> {
        self.api
            .delete(&format!("/hospital/deleteHospital/{id}"))
            .await?;
        self.invalidate();
        info!(%id, "Hospital deleted");
        Ok(())
    }
}

fn parse_hospital(body: Value) -> Result<Hospital> {
    serde_json::from_value(unwrap_envelope(body))
        .map_err(|e| ClientError::invalid_response(format!("hospital: {e}")))
}
