//! Contact repository operations.
//!
//! [`ContactRepository`] turns API-level requests into [`ContactStore`]
//! calls: it validates input, pre-checks phone uniqueness, builds listing
//! queries, and maps store failures into [`ContactError`] kinds. Every
//! operation logs its outcome with the identifier or field involved.
//!
//! The phone pre-check is best-effort. Two concurrent writes can both pass
//! it; the loser then fails at the store's unique constraint, which is
//! reported as [`ContactError::Conflict`] as well.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::ListCache;
use crate::error::{
    ContactError, ContactResult, StoreError, EMPTY_FIELDS_MESSAGE, REQUIRED_MESSAGE,
};
use crate::models::{Contact, ContactFilter, ContactPage, ContactPatch, NewContact};
use crate::query::Pagination;
use crate::store::ContactStore;
use crate::validate::{validate_contact, validate_new};

/// Confirmation message returned by [`ContactRepository::delete`].
pub const DELETED_MESSAGE: &str = "Contact deleted";

/// Validated CRUD and search operations over a [`ContactStore`].
pub struct ContactRepository {
    store: Arc<dyn ContactStore>,
    cache: Option<ListCache>,
}

impl ContactRepository {
    /// Repository without a listing cache.
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store, cache: None }
    }

    /// Repository whose unfiltered listing is cached for `ttl`.
    pub fn with_cache(store: Arc<dyn ContactStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: Some(ListCache::new(ttl)),
        }
    }

    pub fn cache(&self) -> Option<&ListCache> {
        self.cache.as_ref()
    }

    fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Create a contact.
    ///
    /// Fails with `Validation` if a field is missing or blank, and with
    /// `Conflict` if the phone number is already taken.
    pub async fn create(&self, input: NewContact) -> ContactResult<Contact> {
        debug!(phone = ?input.phone, "creating contact");

        let valid = validate_new(&input).map_err(|fields| {
            warn!(?fields, "create rejected: missing required fields");
            ContactError::validation(REQUIRED_MESSAGE, fields)
        })?;

        if self
            .store
            .find_by_phone(&valid.phone)
            .await
            .map_err(|e| store_failure("create", &valid.phone, e))?
            .is_some()
        {
            warn!(phone = %valid.phone, "create rejected: phone already exists");
            return Err(ContactError::Conflict);
        }

        let contact = valid.into_contact(Uuid::new_v4().to_string());
        self.store
            .insert(&contact)
            .await
            .map_err(|e| store_failure("create", &contact.phone, e))?;
        self.invalidate_cache();

        info!(id = %contact.id, "contact created");
        Ok(contact)
    }

    /// Search contacts by case-insensitive field prefixes.
    pub async fn search(
        &self,
        filter: &ContactFilter,
        pagination: Pagination,
    ) -> ContactResult<ContactPage> {
        debug!(?filter, page = pagination.page, limit = pagination.limit, "searching contacts");
        let page = self.load_page(filter, pagination, "search").await?;
        info!(
            page = page.current_page,
            limit = pagination.limit,
            returned = page.contacts.len(),
            total_pages = page.total_pages,
            "contacts retrieved"
        );
        Ok(page)
    }

    /// Unfiltered listing, served from the listing cache when enabled.
    pub async fn list_all(&self, pagination: Pagination) -> ContactResult<ContactPage> {
        debug!(page = pagination.page, limit = pagination.limit, "listing all contacts");

        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&pagination)) {
            info!(page = pagination.page, "returning cached contacts");
            return Ok(cached);
        }

        let generation = self.cache.as_ref().map(ListCache::generation);
        let page = self
            .load_page(&ContactFilter::default(), pagination, "list_all")
            .await?;
        if let (Some(cache), Some(generation)) = (&self.cache, generation) {
            if !cache.insert(pagination, page.clone(), generation) {
                debug!(page = pagination.page, "listing changed while loading, not cached");
            }
        }
        info!(page = page.current_page, returned = page.contacts.len(), "contacts listed");
        Ok(page)
    }

    async fn load_page(
        &self,
        filter: &ContactFilter,
        pagination: Pagination,
        op: &'static str,
    ) -> ContactResult<ContactPage> {
        let contacts = self
            .store
            .find(filter, &pagination)
            .await
            .map_err(|e| store_failure(op, "-", e))?;
        let total = self
            .store
            .count(filter)
            .await
            .map_err(|e| store_failure(op, "-", e))?;

        Ok(ContactPage {
            contacts,
            total_pages: pagination.total_pages(total),
            current_page: pagination.page,
        })
    }

    /// Fetch a contact by id. Malformed ids are treated as misses.
    pub async fn get_by_id(&self, id: &str) -> ContactResult<Contact> {
        debug!(%id, "getting contact by id");
        match self.lookup(id, "get_by_id").await? {
            Some(contact) => {
                info!(%id, "contact retrieved");
                Ok(contact)
            }
            None => {
                warn!(%id, "contact not found");
                Err(ContactError::NotFound)
            }
        }
    }

    /// Fetch a contact by exact phone number.
    pub async fn get_by_phone(&self, phone: &str) -> ContactResult<Contact> {
        debug!(%phone, "getting contact by phone");
        let found = self
            .store
            .find_by_phone(phone)
            .await
            .map_err(|e| store_failure("get_by_phone", phone, e))?;
        match found {
            Some(contact) => {
                info!(%phone, id = %contact.id, "contact retrieved by phone");
                Ok(contact)
            }
            None => {
                warn!(%phone, "contact not found with phone");
                Err(ContactError::NotFound)
            }
        }
    }

    /// Apply a full or partial update.
    ///
    /// Order of checks: unknown id, then required fields on the merged
    /// record, then phone uniqueness against other contacts.
    pub async fn update(&self, id: &str, patch: ContactPatch) -> ContactResult<Contact> {
        debug!(%id, ?patch, "updating contact");

        let existing = match self.lookup(id, "update").await? {
            Some(contact) => contact,
            None => {
                warn!(%id, "contact not found for update");
                return Err(ContactError::NotFound);
            }
        };

        let merged = patch.apply_to(&existing);
        let fields = validate_contact(&merged);
        if !fields.is_empty() {
            warn!(%id, ?fields, "update rejected: invalid fields");
            return Err(ContactError::validation(EMPTY_FIELDS_MESSAGE, fields));
        }

        if let Some(phone) = patch.phone.as_deref() {
            let owner = self
                .store
                .find_by_phone(phone)
                .await
                .map_err(|e| store_failure("update", id, e))?;
            if owner.is_some_and(|other| other.id != existing.id) {
                warn!(%id, %phone, "update rejected: phone already exists");
                return Err(ContactError::Conflict);
            }
        }

        let replaced = self
            .store
            .replace(&merged)
            .await
            .map_err(|e| store_failure("update", id, e))?;
        if !replaced {
            warn!(%id, "contact disappeared before update");
            return Err(ContactError::NotFound);
        }
        self.invalidate_cache();

        info!(%id, "contact updated");
        Ok(merged)
    }

    /// Hard-delete a contact, returning the confirmation message.
    pub async fn delete(&self, id: &str) -> ContactResult<&'static str> {
        debug!(%id, "deleting contact");
        if Uuid::parse_str(id).is_err() {
            warn!(%id, "contact not found for deletion (malformed id)");
            return Err(ContactError::NotFound);
        }
        let removed = self
            .store
            .delete(id)
            .await
            .map_err(|e| store_failure("delete", id, e))?;
        if !removed {
            warn!(%id, "contact not found for deletion");
            return Err(ContactError::NotFound);
        }
        self.invalidate_cache();

        info!(%id, "contact deleted");
        Ok(DELETED_MESSAGE)
    }

    async fn lookup(&self, id: &str, op: &'static str) -> ContactResult<Option<Contact>> {
        if Uuid::parse_str(id).is_err() {
            return Ok(None);
        }
        self.store
            .find_by_id(id)
            .await
            .map_err(|e| store_failure(op, id, e))
    }
}

/// Map a store failure to a [`ContactError`], logging backend faults.
fn store_failure(op: &'static str, key: &str, err: StoreError) -> ContactError {
    match err {
        StoreError::UniqueViolation => {
            warn!(op, key, "store rejected write: phone already exists");
            ContactError::Conflict
        }
        StoreError::Backend(source) => {
            error!(op, key, error = %source, "store operation failed");
            ContactError::Store(StoreError::Backend(source))
        }
    }
}
