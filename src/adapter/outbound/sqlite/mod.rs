//! SQLite persistence adapters.
//!
//! Provides the SQLite-backed implementation of every store port using
//! Diesel ORM.

pub mod database;
mod store;

pub use store::SqliteStore;
