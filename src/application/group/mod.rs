//! OSF group membership and node permission services.
//!
//! Every operation reads a fresh [`Roster`](crate::domain::Roster) snapshot,
//! checks it, then writes through the store and appends to the group log.

mod service;

pub use service::GroupService;
