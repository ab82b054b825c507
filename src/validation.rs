//! Input validation shared by the services and the web forms.
//!
//! Every check here is a plain function over strings so the services can
//! enforce the same rules whether they are called from a handler, a test,
//! or any other caller.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const TASK_CONTENT_MAX_LEN: usize = 255;
pub const TAG_NAME_MAX_LEN: usize = 50;
pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PASSWORD_MIN_LEN: usize = 8;

const REQUIRED: &str = "This field is required.";

/// Field name -> messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(value)` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

fn required_bounded(field: &str, raw: &str, max_len: usize) -> Result<String, ValidationErrors> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationErrors::single(field, REQUIRED));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(ValidationErrors::single(
            field,
            format!("Ensure this value has at most {max_len} characters (it has {len})."),
        ));
    }
    Ok(value.to_string())
}

/// Trims and checks task content: required, at most 255 characters.
pub fn normalize_task_content(raw: &str) -> Result<String, ValidationErrors> {
    required_bounded("content", raw, TASK_CONTENT_MAX_LEN)
}

/// Trims and checks a tag name: required, at most 50 characters.
pub fn normalize_tag_name(raw: &str) -> Result<String, ValidationErrors> {
    required_bounded("name", raw, TAG_NAME_MAX_LEN)
}

pub fn normalize_username(raw: &str) -> Result<String, ValidationErrors> {
    let username = required_bounded("username", raw, USERNAME_MAX_LEN)?;
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(ValidationErrors::single(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(username)
}

pub fn normalize_email(raw: &str) -> Result<String, ValidationErrors> {
    let email = required_bounded("email", raw, EMAIL_MAX_LEN)?;
    let invalid = || ValidationErrors::single("email", "Enter a valid email address.");

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..");
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(email)
}

/// Checks a new password and its confirmation. Passwords are not trimmed.
pub fn check_password_pair(password: &str, confirmation: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if password.is_empty() {
        errors.add("password1", REQUIRED);
    } else {
        if password.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
            );
        }
        if password.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password1", "This password is entirely numeric.");
        }
    }

    if confirmation.is_empty() {
        errors.add("password2", REQUIRED);
    } else if !password.is_empty() && password != confirmation {
        errors.add("password2", "The two password fields didn't match.");
    }

    errors.into_result(())
}
