//! Schema setup.
//!
//! Creates the `contacts` table and its indexes. Every statement is
//! `IF NOT EXISTS`, so running it on each startup is safe.
//!
//! Each searchable field has a `*_fold` shadow column holding its
//! [`fold_case`] form. Prefix search runs against those columns, so case
//! folding covers all of Unicode rather than only what SQLite's `LIKE`
//! folds (ASCII).
//!
//! | Index | Columns | Unique |
//! |-------|---------|--------|
//! | `idx_contacts_phone` | `phone` | yes |
//! | `idx_contacts_first_name_fold` | `first_name_fold` | no |
//! | `idx_contacts_last_name_fold` | `last_name_fold` | no |
//! | `idx_contacts_phone_fold` | `phone_fold` | no |
//! | `idx_contacts_address_fold` | `address_fold` | no |

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use tracing::info;

use contact_book_core::query::fold_case;

const FOLD_COLUMNS: [&str; 4] = [
    "first_name_fold",
    "last_name_fold",
    "phone_fold",
    "address_fold",
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL CHECK (length(trim(first_name)) > 0),
            last_name TEXT NOT NULL CHECK (length(trim(last_name)) > 0),
            phone TEXT NOT NULL CHECK (length(trim(phone)) > 0),
            address TEXT NOT NULL CHECK (length(trim(address)) > 0),
            first_name_fold TEXT NOT NULL DEFAULT '',
            last_name_fold TEXT NOT NULL DEFAULT '',
            phone_fold TEXT NOT NULL DEFAULT '',
            address_fold TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    add_fold_columns(pool).await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_contacts_phone ON contacts(phone)")
        .execute(pool)
        .await?;

    // Superseded by the fold-column indexes.
    for legacy in [
        "idx_contacts_first_name",
        "idx_contacts_last_name",
        "idx_contacts_address",
    ] {
        sqlx::query(&format!("DROP INDEX IF EXISTS {}", legacy))
            .execute(pool)
            .await?;
    }

    for column in FOLD_COLUMNS {
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_contacts_{column} ON contacts({column})"
        ))
        .execute(pool)
        .await?;
    }

    info!("contacts schema ready");
    Ok(())
}

/// Upgrade a `contacts` table created before the fold columns existed:
/// add the columns, then fill them from the stored values.
async fn add_fold_columns(pool: &SqlitePool) -> Result<()> {
    let present = sqlx::query("SELECT first_name_fold FROM contacts LIMIT 0")
        .execute(pool)
        .await
        .is_ok();
    if present {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for column in FOLD_COLUMNS {
        sqlx::query(&format!(
            "ALTER TABLE contacts ADD COLUMN {column} TEXT NOT NULL DEFAULT ''"
        ))
        .execute(&mut *tx)
        .await?;
    }

    let rows = sqlx::query("SELECT id, first_name, last_name, phone, address FROM contacts")
        .fetch_all(&mut *tx)
        .await?;
    for row in &rows {
        let id: String = row.try_get("id")?;
        let first_name: String = row.try_get("first_name")?;
        let last_name: String = row.try_get("last_name")?;
        let phone: String = row.try_get("phone")?;
        let address: String = row.try_get("address")?;

        sqlx::query(
            r#"
            UPDATE contacts
            SET first_name_fold = ?, last_name_fold = ?, phone_fold = ?, address_fold = ?
            WHERE id = ?
            "#,
        )
        .bind(fold_case(&first_name))
        .bind(fold_case(&last_name))
        .bind(fold_case(&phone))
        .bind(fold_case(&address))
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(backfilled = rows.len(), "added case-folded search columns");
    Ok(())
}
