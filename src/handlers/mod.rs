pub mod credentials;
pub mod healthcheck;
