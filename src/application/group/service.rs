//! Group use cases.
//!
//! `auth` is the acting user. `None` is a system action: the manager check is
//! skipped and log entries carry no user.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::domain::log::node_action;
use crate::domain::sanitize::strip_html;
use crate::domain::{
    DomainError, Group, GroupId, GroupLog, GroupLogAction, GroupPermission, GroupRole, LogParams,
    Node, NodeLog, NodePermission, Permission, Roster, User, UserId,
};
use crate::error::{Error, Result};
use crate::log_params;
use crate::port::outbound::notifier::{Event, MemberEvent, NodeGrantEvent, NotifierRegistry};
use crate::port::outbound::store::{GroupStore, NodeStore, Transactional, UserStore};

const MANAGER_REQUIRED: &str = "Must be a group manager to modify group membership.";

pub struct GroupService<S> {
    store: Arc<S>,
    notifiers: Arc<NotifierRegistry>,
    /// Events raised inside a transaction, sent once it commits.
    pending: Option<Mutex<Vec<Event>>>,
}

impl<S> GroupService<S>
where
    S: GroupStore + UserStore + NodeStore + Transactional,
{
    pub fn new(store: Arc<S>, notifiers: Arc<NotifierRegistry>) -> Self {
        Self {
            store,
            notifiers,
            pending: None,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn group(&self, id: &GroupId) -> Result<Group> {
        self.store
            .group(id)
            .await?
            .ok_or_else(|| Error::not_found("group", id))
    }

    pub async fn roster(&self, group: &Group) -> Result<Roster> {
        self.store.roster(&group.id).await
    }

    /// Nodes the group can read.
    pub async fn nodes(&self, group: &Group) -> Result<Vec<Node>> {
        self.store.group_nodes(&group.id).await
    }

    pub async fn groups_for_user(&self, user: &UserId) -> Result<Vec<Group>> {
        self.store.groups_for_user(user).await
    }

    pub async fn logs(&self, group: &Group) -> Result<Vec<GroupLog>> {
        self.store.group_logs(&group.id).await
    }

    /// Whether `user` may act on `group` with `permission`.
    pub async fn has_permission(
        &self,
        group: &Group,
        user: Option<&User>,
        permission: GroupPermission,
    ) -> Result<bool> {
        Ok(self.roster(group).await?.has_permission(user, permission))
    }

    /// Highest permission `group` holds on `node`.
    pub async fn permission_on_node(&self, group: &Group, node: &Node) -> Result<Option<Permission>> {
        let perms = self.store.node_permissions(&group.id, &node.id).await?;
        Ok(Permission::reduce(&perms))
    }

    /// A copy of the service whose store calls share one transaction.
    ///
    /// Events are held back until [`commit`](Self::commit).
    async fn begin(&self) -> Result<Self> {
        Ok(Self {
            store: Arc::new(self.store.begin().await?),
            notifiers: Arc::clone(&self.notifiers),
            pending: Some(Mutex::new(Vec::new())),
        })
    }

    async fn commit(&self) -> Result<()> {
        self.store.commit().await?;
        if let Some(pending) = &self.pending {
            let events = std::mem::take(&mut *pending.lock());
            for event in events {
                self.notifiers.notify_all(event);
            }
        }
        Ok(())
    }

    fn emit(&self, event: Event) {
        match &self.pending {
            Some(pending) => pending.lock().push(event),
            None => self.notifiers.notify_all(event),
        }
    }

    /// Persist a new group and make `creator` its first manager.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a name that is blank once HTML is
    /// stripped, and fails for a disabled creator. Nothing is written then.
    pub async fn create(&self, name: &str, creator: &User) -> Result<Group> {
        let name = clean_name(name)?;
        disabled_user_check(creator)?;

        let tx = self.begin().await?;
        let group = Group::new(name, Some(creator.id.clone()));
        tx.store.save_group(&group).await?;
        tx.add_log(
            &group,
            GroupLogAction::GroupCreated,
            log_params!("group" => group.id.as_str()),
            Some(creator),
        )
        .await?;
        tx.set_manager(&group, creator, None).await?;
        tx.commit().await?;

        info!(group = %group.id, name = %group.name, creator = %creator.id, "Group created");
        Ok(group)
    }

    /// Add `user` as a member, or demote a manager to member.
    ///
    /// Returns `false` when the user is already a plain member.
    ///
    /// # Errors
    ///
    /// Fails for non-manager callers, disabled users and when demoting the
    /// last registered manager.
    pub async fn make_member(&self, group: &Group, user: &User, auth: Option<&User>) -> Result<bool> {
        let tx = self.begin().await?;
        let changed = tx.set_member(group, user, auth).await?;
        tx.commit().await?;
        Ok(changed)
    }

    /// Add `user` as a manager, or promote a member.
    ///
    /// Returns `false` when the user already manages the group.
    ///
    /// # Errors
    ///
    /// Fails for non-manager callers and disabled users.
    pub async fn make_manager(&self, group: &Group, user: &User, auth: Option<&User>) -> Result<bool> {
        let tx = self.begin().await?;
        let changed = tx.set_manager(group, user, auth).await?;
        tx.commit().await?;
        Ok(changed)
    }

    async fn set_member(&self, group: &Group, user: &User, auth: Option<&User>) -> Result<bool> {
        let roster = self.roster(group).await?;
        require_manager(&roster, auth)?;
        disabled_user_check(user)?;

        let adding = !roster.is_member(&user.id);
        if roster.members_only().any(|m| m.id == user.id) {
            return Ok(false);
        }

        if roster.is_manager(&user.id) {
            roster.enforce_one_manager(&user.id)?;
            self.store.set_role(&group.id, &user.id, GroupRole::Member).await?;
            self.add_role_updated_log(group, user, GroupRole::Member, auth).await?;
        } else {
            self.store.set_role(&group.id, &user.id, GroupRole::Member).await?;
            self.add_log(
                group,
                GroupLogAction::MemberAdded,
                log_params!("group" => group.id.as_str(), "user" => user.id.as_str()),
                auth,
            )
            .await?;
        }

        if adding {
            self.send_member_added(group, user, GroupRole::Member, auth);
        }
        debug!(group = %group.id, user = %user.id, "Member set");
        Ok(true)
    }

    async fn set_manager(&self, group: &Group, user: &User, auth: Option<&User>) -> Result<bool> {
        let roster = self.roster(group).await?;
        require_manager(&roster, auth)?;
        disabled_user_check(user)?;

        let adding = !roster.is_member(&user.id);
        if roster.is_manager(&user.id) {
            return Ok(false);
        }

        if adding {
            self.add_log(
                group,
                GroupLogAction::ManagerAdded,
                log_params!("group" => group.id.as_str(), "user" => user.id.as_str()),
                auth,
            )
            .await?;
        } else {
            self.add_role_updated_log(group, user, GroupRole::Manager, auth).await?;
        }
        self.store.set_role(&group.id, &user.id, GroupRole::Manager).await?;

        if adding {
            self.send_member_added(group, user, GroupRole::Manager, auth);
        }
        debug!(group = %group.id, user = %user.id, "Manager set");
        Ok(true)
    }

    /// Invite someone by email who has no account yet.
    ///
    /// An unclaimed placeholder account is reused when one exists for the
    /// email. The invitation is recorded on the user under the group id.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UserAlreadyExists`] when the email belongs to a
    /// registered user or to someone already in the group.
    pub async fn add_unregistered_member(
        &self,
        group: &Group,
        fullname: &str,
        email: &str,
        auth: &User,
        role: GroupRole,
    ) -> Result<User> {
        let tx = self.begin().await?;
        let roster = tx.roster(group).await?;
        require_manager(&roster, Some(auth))?;

        let mut user = match tx.store.user_by_email(email).await? {
            Some(existing) if existing.is_registered || roster.is_member(&existing.id) => {
                return Err(DomainError::UserAlreadyExists.into());
            }
            Some(existing) => existing,
            None => User::unregistered(fullname, email),
        };

        user.add_unclaimed_record(group.id.as_str(), Some(&auth.id), fullname, email);
        tx.store.save_user(&user).await?;

        match role {
            GroupRole::Manager => tx.set_manager(group, &user, Some(auth)).await?,
            GroupRole::Member => tx.set_member(group, &user, Some(auth)).await?,
        };
        tx.commit().await?;

        info!(group = %group.id, user = %user.id, role = %role, "Unregistered user invited");
        Ok(user)
    }

    /// Swap an unregistered member for the account that claimed the invite.
    ///
    /// `new` ends up with the higher of its own role and `old`'s; a claim
    /// never demotes. Returns `false` when `old` is not in the group.
    pub async fn replace_contributor(&self, group: &Group, old: &mut User, new: &User) -> Result<bool> {
        let tx = self.begin().await?;
        let roster = tx.roster(group).await?;
        if !roster.is_member(&old.id) {
            return Ok(false);
        }

        let mut claimed = old.clone();
        if claimed.unclaimed_records.remove(group.id.as_str()).is_some() {
            tx.store.save_user(&claimed).await?;
        }

        let role = if roster.is_manager(&old.id) || roster.is_manager(&new.id) {
            GroupRole::Manager
        } else {
            GroupRole::Member
        };
        tx.store.remove_membership(&group.id, &old.id).await?;
        tx.store.set_role(&group.id, &new.id, role).await?;
        tx.commit().await?;

        *old = claimed;
        debug!(group = %group.id, old = %old.id, new = %new.id, %role, "Member replaced");
        Ok(true)
    }

    /// Remove a member or manager. Users may always remove themselves.
    ///
    /// Returns `false` when the user is not in the group.
    ///
    /// # Errors
    ///
    /// Fails for non-manager callers and when removing the last registered
    /// manager.
    pub async fn remove_member(&self, group: &Group, user: &User, auth: Option<&User>) -> Result<bool> {
        let tx = self.begin().await?;
        let roster = tx.roster(group).await?;
        let removing_self = auth.is_some_and(|a| a.id == user.id);
        if !removing_self {
            require_manager(&roster, auth)?;
        }

        if !roster.is_member(&user.id) {
            return Ok(false);
        }
        roster.enforce_one_manager(&user.id)?;

        tx.store.remove_membership(&group.id, &user.id).await?;
        tx.add_log(
            group,
            GroupLogAction::MemberRemoved,
            log_params!("group" => group.id.as_str(), "user" => user.id.as_str()),
            auth,
        )
        .await?;
        tx.commit().await?;

        info!(group = %group.id, user = %user.id, "Member removed");
        Ok(true)
    }

    /// Rename the group. HTML is stripped from `name`.
    ///
    /// Returns `false` when the sanitized name is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when nothing but markup or whitespace
    /// is left of `name`.
    pub async fn set_group_name(&self, group: &mut Group, name: &str, auth: Option<&User>) -> Result<bool> {
        let new_name = clean_name(name)?;

        let tx = self.begin().await?;
        let roster = tx.roster(group).await?;
        require_manager(&roster, auth)?;
        if group.name == new_name {
            return Ok(false);
        }

        let mut renamed = group.clone();
        let name_original = std::mem::replace(&mut renamed.name, new_name);
        renamed.modified = Utc::now();
        tx.store.save_group(&renamed).await?;
        tx.add_log(
            &renamed,
            GroupLogAction::EditedName,
            log_params!("group" => renamed.id.as_str(), "name_original" => name_original),
            auth,
        )
        .await?;
        tx.commit().await?;

        *group = renamed;
        Ok(true)
    }

    /// Grant the group `permission` on `node`.
    ///
    /// An existing grant at a different level is updated instead; one at the
    /// same level returns `false`.
    pub async fn add_group_to_node(
        &self,
        group: &Group,
        node: &Node,
        permission: Permission,
        auth: Option<&User>,
    ) -> Result<bool> {
        let tx = self.begin().await?;
        let roster = tx.roster(group).await?;
        require_manager(&roster, auth)?;

        let current = tx.store.node_permissions(&group.id, &node.id).await?;
        let changed = if current.is_empty() {
            tx.grant_node(group, node, permission, &roster, auth).await?;
            true
        } else {
            tx.regrant_node(group, node, permission, &current, auth).await?
        };
        tx.commit().await?;
        Ok(changed)
    }

    /// Change the level of an existing grant.
    ///
    /// Returns `false` when the group already holds `permission`.
    pub async fn update_group_permissions_to_node(
        &self,
        group: &Group,
        node: &Node,
        permission: Permission,
        auth: Option<&User>,
    ) -> Result<bool> {
        let tx = self.begin().await?;
        let current = tx.store.node_permissions(&group.id, &node.id).await?;
        let changed = tx.regrant_node(group, node, permission, &current, auth).await?;
        tx.commit().await?;
        Ok(changed)
    }

    async fn grant_node(
        &self,
        group: &Group,
        node: &Node,
        permission: Permission,
        roster: &Roster,
        auth: Option<&User>,
    ) -> Result<()> {
        self.store
            .set_node_permissions(&group.id, &node.id, permission.node_permissions())
            .await?;

        let params = log_params!(
            "group" => group.id.as_str(),
            "node" => node.id.as_str(),
            "permission" => permission.as_str(),
        );
        self.add_log(group, GroupLogAction::NodeConnected, params.clone(), auth)
            .await?;
        self.add_node_log(node, node_action::GROUP_ADDED, params, auth)
            .await?;

        for member in roster.members() {
            self.emit(Event::GroupAddedToNode(NodeGrantEvent {
                group_id: group.id.clone(),
                node_id: node.id.clone(),
                user_id: member.id.clone(),
                permission: Some(permission),
                acting_user: auth.map(|a| a.id.clone()),
            }));
        }

        info!(group = %group.id, node = %node.id, %permission, "Group connected to node");
        Ok(())
    }

    async fn regrant_node(
        &self,
        group: &Group,
        node: &Node,
        permission: Permission,
        current: &[NodePermission],
        auth: Option<&User>,
    ) -> Result<bool> {
        if Permission::reduce(current) == Some(permission) {
            return Ok(false);
        }

        self.store
            .set_node_permissions(&group.id, &node.id, permission.node_permissions())
            .await?;

        let params = log_params!(
            "group" => group.id.as_str(),
            "node" => node.id.as_str(),
            "permission" => permission.as_str(),
        );
        self.add_log(group, GroupLogAction::NodePermsUpdated, params.clone(), auth)
            .await?;
        self.add_node_log(node, node_action::GROUP_UPDATED, params, auth)
            .await?;

        info!(group = %group.id, node = %node.id, %permission, "Group permissions updated");
        Ok(true)
    }

    /// Revoke every grant the group holds on `node`.
    ///
    /// Returns `false` when there was nothing to revoke.
    pub async fn remove_group_from_node(&self, group: &Group, node: &Node, auth: Option<&User>) -> Result<bool> {
        let tx = self.begin().await?;
        if tx.store.remove_node_permissions(&group.id, &node.id).await? == 0 {
            return Ok(false);
        }

        let params = log_params!("group" => group.id.as_str(), "node" => node.id.as_str());
        tx.add_log(group, GroupLogAction::NodeDisconnected, params.clone(), auth)
            .await?;
        tx.add_node_log(node, node_action::GROUP_REMOVED, params, auth)
            .await?;

        let roster = tx.roster(group).await?;
        for member in roster.members() {
            tx.emit(Event::ContributorRemoved(NodeGrantEvent {
                group_id: group.id.clone(),
                node_id: node.id.clone(),
                user_id: member.id.clone(),
                permission: None,
                acting_user: auth.map(|a| a.id.clone()),
            }));
        }
        tx.commit().await?;

        info!(group = %group.id, node = %node.id, "Group disconnected from node");
        Ok(true)
    }

    /// Delete the group with its memberships, grants and log.
    pub async fn remove_group(&self, group: &Group, auth: Option<&User>) -> Result<()> {
        let roster = self.roster(group).await?;
        require_manager(&roster, auth)?;

        self.store.delete_group(&group.id).await?;
        info!(group = %group.id, "Group removed");
        Ok(())
    }

    async fn add_role_updated_log(
        &self,
        group: &Group,
        user: &User,
        role: GroupRole,
        auth: Option<&User>,
    ) -> Result<()> {
        self.add_log(
            group,
            GroupLogAction::RoleUpdated,
            log_params!(
                "group" => group.id.as_str(),
                "new_role" => role.as_str(),
                "user" => user.id.as_str(),
            ),
            auth,
        )
        .await
    }

    async fn add_log(
        &self,
        group: &Group,
        action: GroupLogAction,
        params: LogParams,
        auth: Option<&User>,
    ) -> Result<()> {
        let log = GroupLog::new(group.id.clone(), action, auth.map(|a| a.id.clone()), params);
        self.store.add_group_log(&log).await
    }

    async fn add_node_log(
        &self,
        node: &Node,
        action: &str,
        params: LogParams,
        auth: Option<&User>,
    ) -> Result<()> {
        let log = NodeLog::new(node.id.clone(), action, auth.map(|a| a.id.clone()), params);
        self.store.add_node_log(&log).await
    }

    fn send_member_added(&self, group: &Group, user: &User, role: GroupRole, auth: Option<&User>) {
        self.emit(Event::MemberAdded(MemberEvent {
            group_id: group.id.clone(),
            group_name: group.name.clone(),
            user_id: user.id.clone(),
            role,
            added_by: auth.map(|a| a.id.clone()),
        }));
    }
}

fn require_manager(roster: &Roster, auth: Option<&User>) -> Result<()> {
    match auth {
        Some(user) if !roster.has_permission(Some(user), GroupPermission::Manage) => {
            Err(Error::Permissions(MANAGER_REQUIRED.into()))
        }
        _ => Ok(()),
    }
}

/// Strip markup and surrounding whitespace; nothing may be left blank.
fn clean_name(name: &str) -> Result<String> {
    let name = strip_html(name).trim().to_string();
    if name.is_empty() {
        return Err(Error::Validation("Group name must not be blank.".into()));
    }
    Ok(name)
}

fn disabled_user_check(user: &User) -> Result<()> {
    if user.is_disabled {
        return Err(DomainError::DeactivatedUser.into());
    }
    Ok(())
}
