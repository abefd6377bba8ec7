use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::LogNotifier;
use crate::domain::{GroupId, GroupRole, NodeId, Permission, UserId};
use crate::port::outbound::notifier::{
    Event, MemberEvent, NodeGrantEvent, Notifier, NotifierRegistry, NullNotifier,
};

struct CountingNotifier {
    count: Arc<AtomicUsize>,
}

impl Notifier for CountingNotifier {
    fn notify(&self, _event: Event) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

fn member_added() -> Event {
    Event::MemberAdded(MemberEvent {
        group_id: GroupId::new("g1"),
        group_name: "Lab".into(),
        user_id: UserId::new("abcde"),
        role: GroupRole::Member,
        added_by: Some(UserId::new("zyxwv")),
    })
}

fn grant(permission: Option<Permission>) -> NodeGrantEvent {
    NodeGrantEvent {
        group_id: GroupId::new("g1"),
        node_id: NodeId::new("nodea"),
        user_id: UserId::new("abcde"),
        permission,
        acting_user: None,
    }
}

#[test]
fn test_registry_notify_all() {
    let count = Arc::new(AtomicUsize::new(0));
    let mut registry = NotifierRegistry::new();

    registry.register(Box::new(CountingNotifier {
        count: count.clone(),
    }));
    registry.register(Box::new(CountingNotifier {
        count: count.clone(),
    }));

    registry.notify_all(member_added());

    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_null_notifier() {
    let notifier = NullNotifier;
    notifier.notify(member_added());
}

#[test]
fn test_registry_len_and_is_empty() {
    let mut registry = NotifierRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);

    registry.register(Box::new(NullNotifier));
    assert!(!registry.is_empty());
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_log_notifier_handles_every_event() {
    let notifier = LogNotifier;
    notifier.notify(member_added());
    notifier.notify(Event::GroupAddedToNode(grant(Some(Permission::Write))));
    notifier.notify(Event::ContributorRemoved(grant(None)));
}
