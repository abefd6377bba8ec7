//! Domain identifier types with proper encapsulation.
//!
//! Two id flavours exist: 24-character hex object ids (schemas, blocks,
//! groups, addon records) and short 5-character guids (users, nodes).

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet for short guids; no vowels and no look-alike characters.
const GUID_ALPHABET: &[u8] = b"23456789abcdefghjkmnpqrstuvwxyz";

/// Length of a short guid.
pub const GUID_LENGTH: usize = 5;

/// Length of an object id.
pub const OBJECT_ID_LENGTH: usize = 24;

/// Generate a fresh 24-character lowercase hex object id.
#[must_use]
pub fn object_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(OBJECT_ID_LENGTH);
    id
}

/// Generate a fresh short guid.
#[must_use]
pub fn guid() -> String {
    let mut rng = rand::thread_rng();
    (0..GUID_LENGTH)
        .map(|_| GUID_ALPHABET[rng.gen_range(0..GUID_ALPHABET.len())] as char)
        .collect()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $generate:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self($generate())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a registration or file-metadata schema.
    SchemaId,
    object_id
);

string_id!(
    /// Identifier of a registration schema block.
    BlockId,
    object_id
);

string_id!(
    /// Identifier of an OSF group.
    GroupId,
    object_id
);

string_id!(
    /// Identifier of a user account.
    UserId,
    guid
);

string_id!(
    /// Identifier of a project or component.
    NodeId,
    guid
);

string_id!(
    /// Identifier of an external (OAuth) account.
    AccountId,
    object_id
);

string_id!(
    /// Identifier of a user- or node-level addon settings record.
    SettingsId,
    object_id
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_are_24_hex_chars() {
        let id = SchemaId::generate();
        assert_eq!(id.as_str().len(), OBJECT_ID_LENGTH);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn guids_use_restricted_alphabet() {
        for _ in 0..50 {
            let id = UserId::generate();
            assert_eq!(id.as_str().len(), GUID_LENGTH);
            assert!(id
                .as_str()
                .bytes()
                .all(|b| GUID_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(GroupId::generate(), GroupId::generate());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = NodeId::new("abc12");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc12\"");
        assert_eq!(id.to_string(), "abc12");
    }
}
