pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod validator;

pub use db::{Credential, CredentialsStorage};
pub use error::{ApiError, StoreError};
