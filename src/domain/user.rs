//! User accounts as far as groups and addons need them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Pending invitation attached to an unregistered user.
///
/// Keyed on the user by the id of the group (or node) that invited them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnclaimedRecord {
    pub name: String,
    pub referrer_id: Option<UserId>,
    pub token: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub fullname: String,
    pub email: Option<String>,
    pub is_registered: bool,
    pub is_disabled: bool,
    pub unclaimed_records: BTreeMap<String, UnclaimedRecord>,
    pub created: DateTime<Utc>,
}

impl User {
    /// A registered, enabled account.
    pub fn registered(fullname: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::generate(),
            fullname: fullname.into(),
            email: Some(email.into()),
            is_registered: true,
            is_disabled: false,
            unclaimed_records: BTreeMap::new(),
            created: Utc::now(),
        }
    }

    /// A placeholder account for someone invited by email.
    pub fn unregistered(fullname: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            is_registered: false,
            ..Self::registered(fullname, email)
        }
    }

    /// Only active users hold object permissions.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_registered && !self.is_disabled
    }

    /// Record an invitation from `referrer` for the resource `key`.
    pub fn add_unclaimed_record(
        &mut self,
        key: impl Into<String>,
        referrer: Option<&UserId>,
        given_name: impl Into<String>,
        email: impl Into<String>,
    ) -> &UnclaimedRecord {
        let record = UnclaimedRecord {
            name: given_name.into(),
            referrer_id: referrer.cloned(),
            token: uuid::Uuid::new_v4().simple().to_string(),
            email: email.into(),
        };
        let key = key.into();
        self.unclaimed_records.insert(key.clone(), record);
        &self.unclaimed_records[&key]
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}
