use std::fmt;

/// Workflow states shared by every entity carrying a `STATUS` column.
pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_APPROVED: &str = "Approved";
pub const STATUS_REJECTED: &str = "Rejected";

const STATUSES: [&str; 3] = [STATUS_PENDING, STATUS_APPROVED, STATUS_REJECTED];

const HTTP_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate
///
/// Implemented by every request payload. Handlers call `validate` before any
/// repository access, so a rejected payload never reaches the database.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// A required text field must be present and not blank.
pub fn required(field: &'static str, value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::new(field, format!("{field} is required"))),
    }
}

pub fn required_id(field: &'static str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(id) if id > 0 => Ok(()),
        Some(_) => Err(ValidationError::new(field, format!("{field} must be a positive id"))),
        None => Err(ValidationError::new(field, format!("{field} is required"))),
    }
}

/// An optional text field, when provided, must not be blank.
pub fn not_blank(field: &'static str, value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(ValidationError::new(field, format!("{field} must not be empty")))
        }
        _ => Ok(()),
    }
}

pub fn email(field: &'static str, value: &Option<String>) -> Result<(), ValidationError> {
    let Some(v) = value else { return Ok(()) };
    let valid = v.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new(field, format!("{field} must be a valid email address")))
    }
}

/// Phone numbers are digits with an optional leading `+`, 7 to 15 digits long.
pub fn phone(field: &'static str, value: &Option<String>) -> Result<(), ValidationError> {
    let Some(v) = value else { return Ok(()) };
    let digits = v.strip_prefix('+').unwrap_or(v);
    if (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new(field, format!("{field} must be a valid phone number")))
    }
}

/// The value a nullable update field sets, if any. Clearing (`Some(None)`) and
/// leaving alone (`None`) both pass format checks.
pub fn provided(value: &Option<Option<String>>) -> &Option<String> {
    value.as_ref().unwrap_or(&None)
}

pub fn url(field: &'static str, value: &Option<String>) -> Result<(), ValidationError> {
    let Some(v) = value else { return Ok(()) };
    let host = v.strip_prefix("https://").or_else(|| v.strip_prefix("http://"));
    if host.is_some_and(|rest| !rest.trim().is_empty()) {
        Ok(())
    } else {
        Err(ValidationError::new(field, format!("{field} must be an http(s) URL")))
    }
}

pub fn status(field: &'static str, value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !STATUSES.contains(&v.as_str()) => Err(ValidationError::new(
            field,
            format!("{field} must be one of {}", STATUSES.join(", ")),
        )),
        _ => Ok(()),
    }
}

pub fn http_method(field: &'static str, value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !HTTP_METHODS.contains(&v.as_str()) => Err(ValidationError::new(
            field,
            format!("{field} must be one of {}", HTTP_METHODS.join(", ")),
        )),
        _ => Ok(()),
    }
}

pub fn non_negative(field: &'static str, value: Option<i32>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::new(field, format!("{field} must not be negative"))),
        _ => Ok(()),
    }
}
