//! OSF groups: a member tier and a manager tier over a set of users.
//!
//! Managers are always members too. The [`Roster`] is a snapshot of who holds
//! which role; every membership rule is evaluated against it so the service
//! layer can check before it writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{GroupId, UserId};
use super::permission::{GroupPermission, GroupRole};
use super::url::SiteUrls;
use super::user::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub creator_id: Option<UserId>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Group {
    pub fn new(name: impl Into<String>, creator_id: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            id: GroupId::generate(),
            name: name.into(),
            creator_id,
            created: now,
            modified: now,
        }
    }

    #[must_use]
    pub fn absolute_api_v2_url(&self, urls: &SiteUrls) -> String {
        urls.api_v2(&format!("/groups/{}/", self.id))
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("/{}/", self.id)
    }

    #[must_use]
    pub fn absolute_url(&self, urls: &SiteUrls) -> String {
        urls.web(&self.url())
    }

    /// Name of the backing member or manager sub-group.
    #[must_use]
    pub fn role_group_name(&self, role: GroupRole) -> String {
        format!("osfgroup_{}_{}", self.id, role.as_str())
    }
}

/// One user's place in a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub user: User,
    pub role: GroupRole,
}

/// Everyone in a group together with their role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    pub memberships: Vec<Membership>,
}

impl Roster {
    #[must_use]
    pub fn new(memberships: Vec<Membership>) -> Self {
        Self { memberships }
    }

    fn role_of(&self, user_id: &UserId) -> Option<GroupRole> {
        self.memberships
            .iter()
            .find(|m| &m.user.id == user_id)
            .map(|m| m.role)
    }

    /// Everyone in the member sub-group, managers included.
    pub fn members(&self) -> impl Iterator<Item = &User> {
        self.memberships.iter().map(|m| &m.user)
    }

    pub fn managers(&self) -> impl Iterator<Item = &User> {
        self.memberships
            .iter()
            .filter(|m| m.role == GroupRole::Manager)
            .map(|m| &m.user)
    }

    /// Members who are not managers.
    pub fn members_only(&self) -> impl Iterator<Item = &User> {
        self.memberships
            .iter()
            .filter(|m| m.role == GroupRole::Member)
            .map(|m| &m.user)
    }

    #[must_use]
    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.role_of(user_id).is_some()
    }

    /// Membership as seen from the user's side: in either tier.
    #[must_use]
    pub fn belongs_to_osfgroup(&self, user_id: &UserId) -> bool {
        self.is_member(user_id)
    }

    #[must_use]
    pub fn is_manager(&self, user_id: &UserId) -> bool {
        self.role_of(user_id) == Some(GroupRole::Manager)
    }

    /// Whether `user` may act on the group with `permission`.
    ///
    /// Inactive users hold no permissions even while they sit in a sub-group.
    #[must_use]
    pub fn has_permission(&self, user: Option<&User>, permission: GroupPermission) -> bool {
        let Some(user) = user else {
            return false;
        };
        if !user.is_active() {
            return false;
        }
        match permission.granted_by() {
            GroupRole::Manager => self.is_manager(&user.id),
            GroupRole::Member => self.is_member(&user.id),
        }
    }

    /// Fail when taking `user_id` out of the manager tier would leave the
    /// group without a registered manager.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NoManagerLeft`].
    pub fn enforce_one_manager(&self, user_id: &UserId) -> Result<(), DomainError> {
        let managers: Vec<&User> = self.managers().collect();
        let sole_manager = managers.len() == 1 && &managers[0].id == user_id;
        let registered_others = managers
            .iter()
            .any(|m| &m.id != user_id && m.is_registered);
        if sole_manager || !registered_others {
            return Err(DomainError::NoManagerLeft);
        }
        Ok(())
    }
}
