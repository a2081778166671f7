//! Client-side form validation.
//!
//! Every rule here runs before a request is built; a payload that fails
//! validation never reaches the backend. Errors are keyed by field name in
//! the order they were detected so a form can render them next to inputs.

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::Serialize;

use crate::auth::{LoginRequest, RegisterRequest};
use crate::hospital::{ContactType, HospitalPayload};

static PERSON_NAME_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[A-Za-z]+( [A-Za-z]+)*$").expect("Invalid person name regex")
});

static USERNAME_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[a-zA-Z0-9@]+$").expect("Invalid username regex"));

static EMAIL_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex")
});

const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Field-level validation failures, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    fields: IndexMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn validate_login(request: &LoginRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let username = request.username.trim();
    if username.is_empty() {
        errors.add("username", "Username is required");
    } else if username.chars().count() < 3 {
        errors.add("username", "Minimum 3 characters required");
    }

    let password = request.password.trim();
    if password.is_empty() {
        errors.add("password", "Password is required");
    } else if password.chars().count() < 6 {
        errors.add("password", "Minimum 6 characters required");
    }

    errors.into_result()
}

pub fn validate_registration(request: &RegisterRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = request.name.trim();
    let name_len = name.chars().count();
    if name.is_empty() {
        errors.add("name", "Full name is required");
    } else if name_len < 3 {
        errors.add("name", "Minimum 3 characters required");
    } else if name_len > 50 {
        errors.add("name", "Maximum 50 characters allowed");
    } else if !PERSON_NAME_REGEX.is_match(name) {
        errors.add("name", "Name can only contain alphabets and spaces");
    }

    let username = request.username.trim();
    let username_len = username.chars().count();
    if username.is_empty() {
        errors.add("username", "Username is required");
    } else if username_len < 3 {
        errors.add("username", "Minimum 3 characters required");
    } else if username_len > 50 {
        errors.add("username", "Maximum 50 characters allowed");
    } else if !USERNAME_REGEX.is_match(username) {
        errors.add("username", "Username can contain only letters, numbers and @");
    }

    if request.password.is_empty() {
        errors.add("password", "Password is required");
    } else if request.password.chars().count() < 8 {
        errors.add("password", "Minimum 8 characters required");
    } else if !is_strong_password(&request.password) {
        errors.add(
            "password",
            "Must contain: uppercase, lowercase, number, and special character",
        );
    }

    if request.confirm_password.is_empty() {
        errors.add("confirmPassword", "Please confirm your password");
    } else if request.confirm_password != request.password {
        errors.add("confirmPassword", "Passwords do not match");
    }

    errors.into_result()
}

/// Mixed case, a digit and a special, nothing outside the allowed set.
fn is_strong_password(password: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);
    password.chars().count() >= 8
        && password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

pub fn validate_hospital(payload: &HospitalPayload) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if payload.name.trim().is_empty() {
        errors.add("hospitalName", "Hospital name is required");
    }
    if payload.address.trim().is_empty() {
        errors.add("hospitalAddress", "Hospital address is required");
    }

    let mut seen_primary = false;
    let mut seen_secondary = false;
    for contact in &payload.contacts {
        let (seen, prefix) = match contact.contact_type {
            ContactType::Primary => (&mut seen_primary, "firstContact"),
            ContactType::Secondary => (&mut seen_secondary, "secondContact"),
        };
        if *seen {
            errors.add(
                prefix,
                format!("Only one {} contact is allowed", contact.contact_type),
            );
            continue;
        }
        *seen = true;

        let email = contact.email.trim();
        if !email.is_empty() && !EMAIL_REGEX.is_match(email) {
            errors.add(format!("{prefix}.email"), "Enter a valid email address");
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hospital::Contact;

    fn registration(name: &str, username: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_login_requires_fields() {
        let errors = validate_login(&LoginRequest::new("", "")).unwrap_err();
        assert_eq!(errors.get("username"), Some("Username is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
    }

    #[test]
    fn test_login_minimum_lengths() {
        let errors = validate_login(&LoginRequest::new("ab", "12345")).unwrap_err();
        assert_eq!(errors.get("username"), Some("Minimum 3 characters required"));
        assert_eq!(errors.get("password"), Some("Minimum 6 characters required"));
        assert!(validate_login(&LoginRequest::new("admin", "secret1")).is_ok());
    }

    #[test]
    fn test_registration_accepts_valid_form() {
        let request = registration("Jane Doe", "jane@1", "Str0ng!pw", "Str0ng!pw");
        assert!(validate_registration(&request).is_ok());
    }

    #[test]
    fn test_registration_rejects_weak_password_and_mismatch() {
        let request = registration("Jane  Doe", "jane doe", "weakpassword", "other");
        let errors = validate_registration(&request).unwrap_err();
        assert_eq!(
            errors.get("name"),
            Some("Name can only contain alphabets and spaces")
        );
        assert_eq!(
            errors.get("username"),
            Some("Username can contain only letters, numbers and @")
        );
        assert_eq!(
            errors.get("password"),
            Some("Must contain: uppercase, lowercase, number, and special character")
        );
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
    }

    #[test]
    fn test_password_rejects_characters_outside_allowed_set() {
        assert!(!is_strong_password("Str0ng!pw#"));
        assert!(is_strong_password("Str0ng!pw"));
    }

    #[test]
    fn test_hospital_requires_name_and_address() {
        let payload = HospitalPayload::new("  ", "");
        let errors = validate_hospital(&payload).unwrap_err();
        assert_eq!(errors.len(), 2);
        let fields: Vec<&str> = errors.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["hospitalName", "hospitalAddress"]);
    }

    #[test]
    fn test_hospital_contact_rules() {
        let payload = HospitalPayload::new("General", "1 Main St")
            .with_contact(Contact::new(ContactType::Primary, "A", "not-an-email", "1"))
            .with_contact(Contact::new(ContactType::Primary, "B", "b@example.com", "2"));
        let errors = validate_hospital(&payload).unwrap_err();
        assert_eq!(
            errors.get("firstContact.email"),
            Some("Enter a valid email address")
        );
        assert_eq!(
            errors.get("firstContact"),
            Some("Only one primary contact is allowed")
        );
    }

    #[test]
    fn test_display_joins_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("a", "first");
        errors.add("b", "second");
        errors.add("a", "ignored");
        assert_eq!(errors.to_string(), "a: first; b: second");
    }
}
