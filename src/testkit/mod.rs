//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`dataverse`] - [`ScriptedDataverse`](dataverse::ScriptedDataverse), a
//!   [`DataverseApi`](crate::port::outbound::dataverse::DataverseApi) with
//!   canned datasets and a call counter.
//! - [`domain`] - Builders for users, nodes, schema documents and accounts.
//! - [`notifier`] - [`RecordingNotifier`](notifier::RecordingNotifier) for
//!   asserting emitted events.
//! - [`store`] - Migrated SQLite stores (in-memory or file-backed).

pub mod dataverse;
pub mod domain;
pub mod notifier;
pub mod store;
