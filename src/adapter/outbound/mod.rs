//! Outbound adapters (driven side).

pub mod dataverse;
pub mod notifier;
pub mod sqlite;
