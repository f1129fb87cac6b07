//! Required-field validation for contact writes.
//!
//! Runs before every create and update, independently of whatever the
//! storage backend enforces. A field is invalid when it is absent or blank
//! after trimming; the stored value is never trimmed.

use serde::Serialize;

use crate::models::{Contact, ContactField, NewContact};

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// JSON field name (`firstName`, `lastName`, `phone`, `address`).
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn required(field: ContactField) -> Self {
        Self {
            field: field.name().to_string(),
            message: format!("{} is required", field.name()),
        }
    }
}

/// The four fields of a create request after validation succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
}

impl ValidContact {
    /// Attach an identifier, producing a record ready to insert.
    pub fn into_contact(self, id: String) -> Contact {
        Contact {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            address: self.address,
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Validate a create request.
///
/// Returns every failing field, in declaration order.
pub fn validate_new(input: &NewContact) -> Result<ValidContact, Vec<FieldError>> {
    let values = [
        (ContactField::FirstName, input.first_name.as_deref()),
        (ContactField::LastName, input.last_name.as_deref()),
        (ContactField::Phone, input.phone.as_deref()),
        (ContactField::Address, input.address.as_deref()),
    ];

    let errors: Vec<FieldError> = values
        .iter()
        .filter(|(_, value)| is_blank(*value))
        .map(|(field, _)| FieldError::required(*field))
        .collect();

    if !errors.is_empty() {
        return Err(errors);
    }

    let take = |v: &Option<String>| v.clone().unwrap_or_default();
    Ok(ValidContact {
        first_name: take(&input.first_name),
        last_name: take(&input.last_name),
        phone: take(&input.phone),
        address: take(&input.address),
    })
}

/// Validate a full record, e.g. after a patch has been merged.
pub fn validate_contact(contact: &Contact) -> Vec<FieldError> {
    ContactField::ALL
        .iter()
        .filter(|field| is_blank(Some(field.value_of(contact))))
        .map(|field| FieldError::required(*field))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> NewContact {
        NewContact {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            phone: Some("0987654321".into()),
            address: Some("456 Elm St".into()),
        }
    }

    #[test]
    fn test_complete_input_passes() {
        let valid = validate_new(&full()).unwrap();
        assert_eq!(valid.first_name, "Jane");
        assert_eq!(valid.address, "456 Elm St");
    }

    #[test]
    fn test_missing_and_blank_fields_reported_in_order() {
        let input = NewContact {
            first_name: None,
            phone: Some("   ".into()),
            ..full()
        };
        let errors = validate_new(&input).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["firstName", "phone"]);
        assert_eq!(errors[0].message, "firstName is required");
    }

    #[test]
    fn test_empty_input_fails_every_field() {
        let errors = validate_new(&NewContact::default()).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_values_are_not_trimmed() {
        let input = NewContact {
            last_name: Some(" Doe ".into()),
            ..full()
        };
        assert_eq!(validate_new(&input).unwrap().last_name, " Doe ");
    }

    #[test]
    fn test_validate_contact_flags_emptied_field() {
        let mut contact = validate_new(&full()).unwrap().into_contact("id-1".into());
        assert!(validate_contact(&contact).is_empty());
        contact.address = String::new();
        let errors = validate_contact(&contact);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "address");
    }
}
