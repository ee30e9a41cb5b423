//! Database module: the credential model and its SQLite-backed store.
//!
//! Layout:
//! - `models.rs`: the credential row, create/patch inputs and validation rules
//! - `schema.rs`: SQL DDL for initializing the database
//! - `sqlite.rs`: timed CRUD operations over the connection pool

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{Credential, CredentialPatch, NewCredential, merge, validate_credential};
pub use schema::SQLITE_INIT;
pub use sqlite::{CredentialsStorage, SqlitePool, connect};
