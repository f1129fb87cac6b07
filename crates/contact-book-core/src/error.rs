//! Error types for Contact Book.
//!
//! [`StoreError`] is what storage backends return; [`ContactError`] is what
//! repository operations return to the HTTP layer.

use thiserror::Error;

use crate::validate::FieldError;

/// Message returned for every lookup miss.
pub const NOT_FOUND_MESSAGE: &str = "Contact not found";

/// Message returned when a phone number is already taken.
pub const CONFLICT_MESSAGE: &str = "Phone number already exists";

/// Message returned when a create request is missing fields.
pub const REQUIRED_MESSAGE: &str = "All fields are required: firstName, lastName, phone, address";

/// Message returned when an update leaves a required field empty.
pub const EMPTY_FIELDS_MESSAGE: &str = "Required fields must not be empty";

/// Errors raised by a [`ContactStore`](crate::store::ContactStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store's unique phone index rejected the write.
    #[error("unique constraint violated on phone")]
    UniqueViolation,

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

/// Errors returned by repository operations.
#[derive(Error, Debug)]
pub enum ContactError {
    /// Missing or empty required fields.
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    /// Phone number belongs to another contact.
    #[error("Phone number already exists")]
    Conflict,

    /// No contact for the given id or phone.
    #[error("Contact not found")]
    NotFound,

    /// Unexpected backend failure.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl ContactError {
    pub fn validation(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        ContactError::Validation {
            message: message.into(),
            fields,
        }
    }
}

impl From<StoreError> for ContactError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation => ContactError::Conflict,
            other => ContactError::Store(other),
        }
    }
}

/// Convenience alias for repository results.
pub type ContactResult<T> = Result<T, ContactError>;

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err: ContactError = StoreError::UniqueViolation.into();
        assert!(matches!(err, ContactError::Conflict));
        assert_eq!(err.to_string(), CONFLICT_MESSAGE);
    }

    #[test]
    fn test_backend_error_maps_to_store() {
        let err: ContactError = StoreError::Backend(anyhow::anyhow!("disk full")).into();
        assert!(matches!(err, ContactError::Store(_)));
    }

    #[test]
    fn test_messages() {
        assert_eq!(ContactError::NotFound.to_string(), NOT_FOUND_MESSAGE);
        let err = ContactError::validation(REQUIRED_MESSAGE, Vec::new());
        assert_eq!(err.to_string(), REQUIRED_MESSAGE);
        let err = ContactError::validation(EMPTY_FIELDS_MESSAGE, Vec::new());
        assert_eq!(err.to_string(), EMPTY_FIELDS_MESSAGE);
    }
}
