//! osfcore - registration schemas, OSF groups and storage addons.
//!
//! The crate keeps the rules of a research data management backend apart
//! from the things it talks to:
//!
//! - **Registration schemas** are versioned questionnaires. Page-based
//!   schemas compile to a JSON schema used to validate registration metadata;
//!   atomic schemas are a flat list of blocks validated response by response.
//! - **OSF groups** are named user collections with a member and a manager
//!   tier. A group can be granted read, write or admin on a node, which every
//!   active member then holds.
//! - **Dataverse** is a storage addon: user credentials, per-node dataset
//!   selection and the WaterButler payloads derived from them.
//!
//! # Modules
//!
//! - [`domain`] - Plain data and rules, no I/O
//! - [`port`] - Traits for storage, the Dataverse API and notifications
//! - [`adapter`] - SQLite store, Dataverse HTTP client, notifiers and the CLI
//! - [`application`] - Services composing ports into use cases
//! - [`infrastructure`] - Configuration and service wiring
//! - [`error`] - Crate-wide error type
//!
//! # Features
//!
//! - `testkit` - Fixtures, an in-memory store and scripted adapters for tests
//!
//! # Example
//!
//! ```no_run
//! use osfcore::domain::User;
//! use osfcore::infrastructure::bootstrap::build_services;
//! use osfcore::infrastructure::config::settings::Config;
//! use osfcore::port::UserStore;
//!
//! # async fn demo() -> osfcore::error::Result<()> {
//! let services = build_services(&Config::load_or_default("config.toml")?)?;
//! let alice = User::registered("Alice", "alice@example.com");
//! services.store.save_user(&alice).await?;
//! let group = services.groups.create("Lab", &alice).await?;
//! assert!(services.groups.roster(&group).await?.is_manager(&alice.id));
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
