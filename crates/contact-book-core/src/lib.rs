//! # Contact Book Core
//!
//! Runtime-agnostic logic for Contact Book: the contact model, required-field
//! validation, listing query construction, the store abstraction with an
//! in-memory backend, and the repository operations the HTTP layer calls.
//!
//! This crate contains no tokio, sqlx, or HTTP dependencies. The SQLite
//! backend and the server live in the `contact-book` crate.

pub mod cache;
pub mod error;
pub mod models;
pub mod query;
pub mod repository;
pub mod store;
pub mod validate;
