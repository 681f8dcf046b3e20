//! # Database Access
//!
//! Connection-pool bootstrap for the Postgres store implementations. Schema
//! lives under `migrations/`.

pub mod connection;

pub use connection::DatabaseConnection;
