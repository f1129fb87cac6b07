//! SQLite-backed [`ContactStore`] implementation.
//!
//! Maps each store operation onto the `contacts` table created by
//! [`migrate`](crate::migrate). Writes also store the [`fold_case`] form of
//! every field in its `*_fold` column. Prefix filters become
//! `<field>_fold LIKE 'folded value%' ESCAPE '\'` clauses, with the value's
//! own wildcard characters escaped, so matching ignores case the same way
//! the in-memory store does.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use contact_book_core::error::{StoreError, StoreResult};
use contact_book_core::models::{Contact, ContactFilter};
use contact_book_core::query::{fold_case, like_prefix_pattern, Pagination};
use contact_book_core::store::ContactStore;

const COLUMNS: &str = "id, first_name, last_name, phone, address";

/// SQLite implementation of the [`ContactStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Translate driver errors, singling out unique-index violations.
fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation;
        }
    }
    StoreError::Backend(err.into())
}

fn row_to_contact(row: &SqliteRow) -> Result<Contact, sqlx::Error> {
    Ok(Contact {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
    })
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ContactFilter) {
    for (i, (field, prefix)) in filter.prefixes().into_iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(field.fold_column());
        qb.push(" LIKE ");
        qb.push_bind(like_prefix_pattern(&fold_case(prefix)));
        qb.push(" ESCAPE '\\'");
    }
}

#[async_trait]
impl ContactStore for SqliteStore {
    async fn insert(&self, contact: &Contact) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO contacts
                (id, first_name, last_name, phone, address,
                 first_name_fold, last_name_fold, phone_fold, address_fold)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&contact.id)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.phone)
        .bind(&contact.address)
        .bind(fold_case(&contact.first_name))
        .bind(fold_case(&contact.last_name))
        .bind(fold_case(&contact.phone))
        .bind(fold_case(&contact.address))
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn find(&self, filter: &ContactFilter, page: &Pagination) -> StoreResult<Vec<Contact>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM contacts", COLUMNS));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY first_name ASC, last_name ASC, id ASC LIMIT ");
        qb.push_bind(i64::try_from(page.limit).unwrap_or(i64::MAX));
        qb.push(" OFFSET ");
        // Clamping keeps an out-of-range skip past the end instead of wrapping.
        qb.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        rows.iter()
            .map(row_to_contact)
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_error)
    }

    async fn count(&self, filter: &ContactFilter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM contacts");
        push_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(count.max(0) as u64)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Contact>> {
        let row = sqlx::query(&format!("SELECT {} FROM contacts WHERE id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.as_ref()
            .map(row_to_contact)
            .transpose()
            .map_err(store_error)
    }

    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<Contact>> {
        let row = sqlx::query(&format!("SELECT {} FROM contacts WHERE phone = ?", COLUMNS))
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.as_ref()
            .map(row_to_contact)
            .transpose()
            .map_err(store_error)
    }

    async fn replace(&self, contact: &Contact) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE contacts
            SET first_name = ?, last_name = ?, phone = ?, address = ?,
                first_name_fold = ?, last_name_fold = ?, phone_fold = ?, address_fold = ?
            WHERE id = ?
            "#,
        )
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.phone)
        .bind(&contact.address)
        .bind(fold_case(&contact.first_name))
        .bind(fold_case(&contact.last_name))
        .bind(fold_case(&contact.phone))
        .bind(fold_case(&contact.address))
        .bind(&contact.id)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }
}
