//! Storage abstraction for Contact Book.
//!
//! The [`ContactStore`] trait defines every persistence operation the
//! repository needs, enabling pluggable backends (SQLite in the application
//! crate, in-memory here).
//!
//! Implementations must be `Send + Sync` to work with async runtimes, and
//! must enforce phone uniqueness themselves by returning
//! [`StoreError::UniqueViolation`](crate::error::StoreError::UniqueViolation).

pub mod memory;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{Contact, ContactFilter};
use crate::query::Pagination;

/// Abstract storage backend for contacts.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](ContactStore::insert) | Persist a new contact |
/// | [`find`](ContactStore::find) | Filtered, ordered page of contacts |
/// | [`count`](ContactStore::count) | Number of contacts matching a filter |
/// | [`find_by_id`](ContactStore::find_by_id) | Exact id lookup |
/// | [`find_by_phone`](ContactStore::find_by_phone) | Exact phone lookup |
/// | [`replace`](ContactStore::replace) | Overwrite an existing contact |
/// | [`delete`](ContactStore::delete) | Hard delete by id |
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Persist a new contact.
    async fn insert(&self, contact: &Contact) -> StoreResult<()>;

    /// Return one page of contacts matching `filter`, ordered by first name,
    /// last name, then id.
    async fn find(&self, filter: &ContactFilter, page: &Pagination) -> StoreResult<Vec<Contact>>;

    /// Count the contacts matching `filter`.
    async fn count(&self, filter: &ContactFilter) -> StoreResult<u64>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Contact>>;

    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<Contact>>;

    /// Overwrite every field of the contact with `contact.id`.
    ///
    /// Returns `false` when no such contact exists.
    async fn replace(&self, contact: &Contact) -> StoreResult<bool>;

    /// Returns `false` when no such contact exists.
    async fn delete(&self, id: &str) -> StoreResult<bool>;
}
