//! Notifier port for group membership events.
//!
//! Services emit an [`Event`] after the change it describes has been
//! persisted. Delivery (email, logging) is up to the registered notifiers.

use crate::domain::{GroupId, GroupRole, NodeId, Permission, UserId};

/// Events that can trigger notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A user joined a group.
    MemberAdded(MemberEvent),
    /// A group was connected to a node; sent once per group member.
    GroupAddedToNode(NodeGrantEvent),
    /// A group was disconnected from a node; sent once per group member.
    ContributorRemoved(NodeGrantEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEvent {
    pub group_id: GroupId,
    pub group_name: String,
    pub user_id: UserId,
    pub role: GroupRole,
    /// Who added the user; `None` for system actions.
    pub added_by: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeGrantEvent {
    pub group_id: GroupId,
    pub node_id: NodeId,
    /// The member being notified.
    pub user_id: UserId,
    /// Permission the group holds after the change, if any.
    pub permission: Option<Permission>,
    pub acting_user: Option<UserId>,
}

/// Trait for notification handlers.
///
/// Notifications are fire-and-forget; `notify` should return quickly.
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

