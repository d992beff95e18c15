use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult};

/// Fields an employee may change about themselves, pending approval.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.address.is_none()
    }

    /// Trims every field, drops blanks and rejects an empty or malformed set.
    pub fn normalized(self) -> DomainResult<Self> {
        let trim = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let changes = Self {
            name: trim(self.name),
            phone: trim(self.phone),
            address: trim(self.address),
        };
        if changes.is_empty() {
            return Err(DomainError::invalid("no profile changes submitted"));
        }
        if let Some(name) = &changes.name {
            if name.chars().count() > 256 {
                return Err(DomainError::invalid("name must be at most 256 characters"));
            }
        }
        if let Some(phone) = &changes.phone {
            validate_phone(phone)?;
        }
        if let Some(address) = &changes.address {
            if address.chars().count() > 1024 {
                return Err(DomainError::invalid(
                    "address must be at most 1024 characters",
                ));
            }
        }
        Ok(changes)
    }
}

pub fn validate_phone(phone: &str) -> DomainResult<()> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if !allowed || !(7..=15).contains(&digits) {
        return Err(DomainError::invalid(format!("invalid phone number: {phone}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_dropped() {
        let changes = ProfileChanges {
            name: Some("  Ada L. ".into()),
            phone: Some("   ".into()),
            address: None,
        }
        .normalized()
        .unwrap();
        assert_eq!(changes.name.as_deref(), Some("Ada L."));
        assert_eq!(changes.phone, None);
    }

    #[test]
    fn empty_change_set_is_rejected() {
        let err = ProfileChanges {
            name: Some(" ".into()),
            ..ProfileChanges::default()
        }
        .normalized();
        assert!(err.is_err());
    }

    #[test]
    fn phone_numbers_are_checked() {
        assert!(validate_phone("+91 98765-43210").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("call me").is_err());
    }
}
