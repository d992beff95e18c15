//! HR rules shared by the SmartHR routes.
//!
//! Everything here is a pure function over values already loaded from the
//! store, so handlers stay a read, a check and a write.

pub mod access;
pub mod leave;
pub mod payroll;
pub mod profile;
pub mod subscription;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("seat limit reached ({limit} seats)")]
    SeatLimitReached { limit: i32 },
    #[error("insufficient leave balance: {requested} days requested, {available} available")]
    InsufficientBalance { requested: i32, available: i32 },
    #[error("{0}")]
    Invalid(String),
}

impl DomainError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Lower-cased, trimmed email with a local part and a domain.
pub fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(DomainError::invalid(format!("invalid email: {raw}"))),
    }
}

/// Company names are the tenant key: trimmed, inner whitespace collapsed.
pub fn normalize_company_name(raw: &str) -> DomainResult<String> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let len = name.chars().count();
    if !(2..=128).contains(&len) {
        return Err(DomainError::invalid(
            "company name must be between 2 and 128 characters",
        ));
    }
    Ok(name)
}

/// Trimmed required text field bounded to `max` characters.
pub fn required_text(field: &str, raw: &str, max: usize) -> DomainResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::invalid(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(DomainError::invalid(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Blank optional text collapses to `None`.
pub fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email(" Ada@Example.com ").unwrap(), "ada@example.com");
        assert!(normalize_email("ada").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("ada@localhost").is_err());
    }

    #[test]
    fn company_names_collapse_whitespace() {
        assert_eq!(
            normalize_company_name("  Acme   Widgets ").unwrap(),
            "Acme Widgets"
        );
        assert!(normalize_company_name(" a ").is_err());
    }

    #[test]
    fn required_text_bounds_length() {
        assert_eq!(required_text("title", "  Hi ", 10).unwrap(), "Hi");
        assert!(required_text("title", "   ", 10).is_err());
        assert!(required_text("title", "abcdef", 5).is_err());
    }
}
