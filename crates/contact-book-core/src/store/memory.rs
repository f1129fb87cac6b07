//! In-memory [`ContactStore`] implementation for testing and ephemeral use.
//!
//! Uses a `HashMap` keyed by id behind `std::sync::RwLock`, plus a phone
//! index that plays the role of the store-level unique constraint. Listing
//! is a filtered scan followed by a sort.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::models::{Contact, ContactFilter};
use crate::query::{listing_order, matches_filter, Pagination};

use super::ContactStore;

#[derive(Default)]
struct Tables {
    contacts: HashMap<String, Contact>,
    /// phone -> id
    phones: HashMap<String, String>,
}

/// In-memory contact store.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Backend(anyhow::anyhow!("in-memory store lock poisoned"))
}

#[async_trait]
impl ContactStore for InMemoryStore {
    async fn insert(&self, contact: &Contact) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        if tables.phones.contains_key(&contact.phone) {
            return Err(StoreError::UniqueViolation);
        }
        if tables.contacts.contains_key(&contact.id) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "duplicate contact id: {}",
                contact.id
            )));
        }
        tables
            .phones
            .insert(contact.phone.clone(), contact.id.clone());
        tables
            .contacts
            .insert(contact.id.clone(), contact.clone());
        Ok(())
    }

    async fn find(&self, filter: &ContactFilter, page: &Pagination) -> StoreResult<Vec<Contact>> {
        let tables = self.tables.read().map_err(poisoned)?;
        let mut matching: Vec<&Contact> = tables
            .contacts
            .values()
            .filter(|c| matches_filter(c, filter))
            .collect();
        matching.sort_by(|a, b| listing_order(a, b));
        Ok(matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &ContactFilter) -> StoreResult<u64> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .contacts
            .values()
            .filter(|c| matches_filter(c, filter))
            .count() as u64)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Contact>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.contacts.get(id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<Contact>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .phones
            .get(phone)
            .and_then(|id| tables.contacts.get(id))
            .cloned())
    }

    async fn replace(&self, contact: &Contact) -> StoreResult<bool> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let old_phone = match tables.contacts.get(&contact.id) {
            Some(existing) => existing.phone.clone(),
            None => return Ok(false),
        };
        if old_phone != contact.phone {
            if tables.phones.contains_key(&contact.phone) {
                return Err(StoreError::UniqueViolation);
            }
            tables.phones.remove(&old_phone);
            tables
                .phones
                .insert(contact.phone.clone(), contact.id.clone());
        }
        tables
            .contacts
            .insert(contact.id.clone(), contact.clone());
        Ok(true)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        match tables.contacts.remove(id) {
            Some(removed) => {
                tables.phones.remove(&removed.phone);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str, first: &str, phone: &str) -> Contact {
        Contact {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            phone: phone.to_string(),
            address: "1 Main St".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let store = InMemoryStore::new();
        store.insert(&contact("a", "John", "111")).await.unwrap();
        let err = store.insert(&contact("b", "Jane", "111")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));
        assert_eq!(store.count(&ContactFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_moves_phone_index() {
        let store = InMemoryStore::new();
        store.insert(&contact("a", "John", "111")).await.unwrap();
        assert!(store.replace(&contact("a", "John", "222")).await.unwrap());
        assert!(store.find_by_phone("111").await.unwrap().is_none());
        assert_eq!(store.find_by_phone("222").await.unwrap().unwrap().id, "a");
        // the old phone is free again
        store.insert(&contact("b", "Jane", "111")).await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_and_delete_unknown_id() {
        let store = InMemoryStore::new();
        assert!(!store.replace(&contact("x", "X", "1")).await.unwrap());
        assert!(!store.delete("x").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_pages_in_order() {
        let store = InMemoryStore::new();
        for (i, name) in ["Carol", "alice", "Bob", "Dave"].iter().enumerate() {
            store
                .insert(&contact(&i.to_string(), name, &format!("p{}", i)))
                .await
                .unwrap();
        }
        let page = Pagination { page: 2, limit: 2 };
        let found = store.find(&ContactFilter::default(), &page).await.unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.first_name.as_str()).collect();
        // byte order: uppercase sorts before lowercase
        assert_eq!(names, vec!["Dave", "alice"]);
    }
}
