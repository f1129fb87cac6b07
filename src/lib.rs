//! # Contact Book
//!
//! A contact-management REST API: create, list, search, update, and delete
//! contact records (name, phone, address) stored in SQLite.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌─────────────┐   ┌──────────┐
//! │   HTTP   │──▶│ ContactRepository │──▶│ ContactStore │──▶│  SQLite  │
//! │  (axum)  │   │ validate + query  │   │   (trait)    │   │ contacts │
//! └──────────┘   └──────────────────┘   └─────────────┘   └──────────┘
//! ```
//!
//! The repository, model, and store trait live in `contact-book-core`;
//! this crate adds the SQLite backend, configuration, and the server.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`db`] | Database connection pool |
//! | [`migrate`] | Schema and index creation |
//! | [`sqlite_store`] | SQLite `ContactStore` backend |
//! | [`server`] | HTTP routes and error mapping |

pub mod config;
pub mod db;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
