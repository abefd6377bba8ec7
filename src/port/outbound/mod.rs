//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies such as storage,
//! the Dataverse API, and notifications.

pub mod dataverse;
pub mod notifier;
pub mod store;
