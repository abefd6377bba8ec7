//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams adapters plug into:
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │ SQLite  │            │  Dataverse  │              │ Notifier  │
//! │ Adapter │            │   Adapter   │              │  Adapter  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```

pub mod outbound;

pub use outbound::dataverse::{DataverseApi, Dataset};
pub use outbound::notifier::{Event, MemberEvent, NodeGrantEvent, Notifier, NotifierRegistry, NullNotifier};
pub use outbound::store::{AddonStore, GroupStore, NodeStore, SchemaStore, Transactional, UserStore};
