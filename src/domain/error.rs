//! Domain rule violations.
//!
//! These are the checks the models enforce themselves, independent of any
//! caller: group membership invariants, permission names, block types.
//!
//! # Examples
//!
//! ```
//! use osfcore::domain::error::DomainError;
//! use osfcore::domain::permission::Permission;
//!
//! let result: Result<Permission, DomainError> = "owner".parse();
//! assert!(matches!(result, Err(DomainError::InvalidPermission(_))));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Disabled accounts can never join a group.
    #[error("Deactivated users cannot be added to OSF Groups.")]
    DeactivatedUser,

    /// A group always keeps at least one registered manager.
    #[error("Group must have at least one manager.")]
    NoManagerLeft,

    /// An unregistered invitation targets someone who is already known.
    #[error("User already exists.")]
    UserAlreadyExists,

    /// Permission name outside read/write/admin.
    #[error("{0} is not a valid permission.")]
    InvalidPermission(String),

    /// Group role outside member/manager.
    #[error("{0} is not a valid group role.")]
    InvalidRole(String),

    /// Unknown schema block type.
    #[error("{0} is not a valid schema block type.")]
    InvalidBlockType(String),

    /// Two blocks of one schema collect the same response key.
    #[error("Response key {0} is used by more than one schema block.")]
    DuplicateResponseKey(String),
}
