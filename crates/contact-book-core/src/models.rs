//! Core data models for Contact Book.
//!
//! These types flow between the HTTP layer, the repository operations,
//! and the storage backends. Wire names are camelCase to match the JSON API.

use serde::{Deserialize, Serialize};

/// A stored contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Store-assigned UUID, immutable once created.
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
}

/// Create request body.
///
/// Every field is optional on the wire so that a missing field surfaces as a
/// validation error rather than a JSON decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Partial update body. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ContactPatch {
    /// Apply the patch on top of an existing record.
    pub fn apply_to(&self, contact: &Contact) -> Contact {
        Contact {
            id: contact.id.clone(),
            first_name: self
                .first_name
                .clone()
                .unwrap_or_else(|| contact.first_name.clone()),
            last_name: self
                .last_name
                .clone()
                .unwrap_or_else(|| contact.last_name.clone()),
            phone: self.phone.clone().unwrap_or_else(|| contact.phone.clone()),
            address: self
                .address
                .clone()
                .unwrap_or_else(|| contact.address.clone()),
        }
    }
}

/// Prefix filters for the search operation.
///
/// Each populated field constrains the result set; fields combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContactFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ContactFilter {
    /// Build a filter, dropping empty values so they impose no constraint.
    pub fn new(
        first_name: Option<String>,
        last_name: Option<String>,
        phone: Option<String>,
        address: Option<String>,
    ) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }
        Self {
            first_name: keep(first_name),
            last_name: keep(last_name),
            phone: keep(phone),
            address: keep(address),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
    }

    /// `(column, prefix)` pairs for every populated field, in a fixed order.
    pub fn prefixes(&self) -> Vec<(ContactField, &str)> {
        [
            (ContactField::FirstName, &self.first_name),
            (ContactField::LastName, &self.last_name),
            (ContactField::Phone, &self.phone),
            (ContactField::Address, &self.address),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

/// The four user-editable contact fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    FirstName,
    LastName,
    Phone,
    Address,
}

impl ContactField {
    pub const ALL: [ContactField; 4] = [
        ContactField::FirstName,
        ContactField::LastName,
        ContactField::Phone,
        ContactField::Address,
    ];

    /// JSON field name.
    pub fn name(self) -> &'static str {
        match self {
            ContactField::FirstName => "firstName",
            ContactField::LastName => "lastName",
            ContactField::Phone => "phone",
            ContactField::Address => "address",
        }
    }

    /// Storage column holding the case-folded copy used for prefix search.
    pub fn fold_column(self) -> &'static str {
        match self {
            ContactField::FirstName => "first_name_fold",
            ContactField::LastName => "last_name_fold",
            ContactField::Phone => "phone_fold",
            ContactField::Address => "address_fold",
        }
    }

    pub fn value_of(self, contact: &Contact) -> &str {
        match self {
            ContactField::FirstName => &contact.first_name,
            ContactField::LastName => &contact.last_name,
            ContactField::Phone => &contact.phone,
            ContactField::Address => &contact.address,
        }
    }
}

/// One page of contacts plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    pub total_pages: u64,
    pub current_page: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Contact {
        Contact {
            id: "c-1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: "555-0100".to_string(),
            address: "12 St James's Square".to_string(),
        }
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let patch = ContactPatch {
            address: Some("Updated Address".to_string()),
            ..Default::default()
        };
        let merged = patch.apply_to(&stored());
        assert_eq!(merged.address, "Updated Address");
        assert_eq!(merged.first_name, "Ada");
        assert_eq!(merged.phone, "555-0100");
        assert_eq!(merged.id, "c-1");
    }

    #[test]
    fn test_filter_drops_empty_values() {
        let filter = ContactFilter::new(Some(String::new()), Some("Do".into()), None, None);
        assert!(filter.first_name.is_none());
        assert_eq!(filter.prefixes(), vec![(ContactField::LastName, "Do")]);
        assert!(ContactFilter::new(None, None, None, Some(String::new())).is_empty());
    }

    #[test]
    fn test_contact_serializes_camel_case() {
        let json = serde_json::to_value(stored()).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["lastName"], "Lovelace");
        assert!(json.get("first_name").is_none());
    }

    #[test]
    fn test_patch_ignores_unknown_fields() {
        let patch: ContactPatch =
            serde_json::from_str(r#"{"_id":"abc","phone":"1","extra":true}"#).unwrap();
        assert_eq!(patch.phone.as_deref(), Some("1"));
        assert!(patch.first_name.is_none());
    }
}
