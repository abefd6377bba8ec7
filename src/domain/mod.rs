//! Storage-agnostic domain logic.
//!
//! Everything here is plain data plus the rules that govern it; persistence
//! and remote calls live behind the ports in [`crate::port`].

pub mod addon;
pub mod error;
pub mod group;
pub mod id;
pub mod jsonschema;
pub mod log;
pub mod metaschema;
pub mod node;
pub mod permission;
pub mod sanitize;
pub mod schema;
pub mod schema_block;
pub mod url;
pub mod user;

// Core domain types
pub use addon::dataverse::{DataverseFile, DataverseNodeSettings, DataverseUserSettings};
pub use addon::ExternalAccount;
pub use error::DomainError;
pub use group::{Group, Membership, Roster};
pub use id::{AccountId, BlockId, GroupId, NodeId, SchemaId, SettingsId, UserId};
pub use log::{GroupLog, GroupLogAction, LogParams, NodeLog};
pub use node::Node;
pub use permission::{GroupPermission, GroupRole, NodePermission, Permission};
pub use schema::{FileMetadataSchema, RegistrationSchema, Schema, SchemaKind};
pub use schema_block::{BlockSpec, BlockType, SchemaBlock};
pub use url::SiteUrls;
pub use user::{UnclaimedRecord, User};
