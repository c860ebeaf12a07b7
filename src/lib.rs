pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod loader;
pub mod models;
pub mod money;
pub mod session;
pub mod store;
pub mod transport;
pub mod validate;
pub mod views;

/// Client version from Cargo.toml (single source of truth)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
