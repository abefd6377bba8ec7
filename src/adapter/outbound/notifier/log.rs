use tracing::info;

use crate::port::outbound::notifier::{Event, Notifier};

/// A notifier that records events through `tracing`.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::MemberAdded(e) => {
                info!(
                    group_id = %e.group_id,
                    group = %e.group_name,
                    user_id = %e.user_id,
                    role = %e.role,
                    added_by = ?e.added_by.as_ref().map(ToString::to_string),
                    "Member added to group"
                );
            }
            Event::GroupAddedToNode(e) => {
                info!(
                    group_id = %e.group_id,
                    node_id = %e.node_id,
                    user_id = %e.user_id,
                    permission = ?e.permission.map(|p| p.as_str()),
                    "Group added to node"
                );
            }
            Event::ContributorRemoved(e) => {
                info!(
                    group_id = %e.group_id,
                    node_id = %e.node_id,
                    user_id = %e.user_id,
                    "Group member removed from node"
                );
            }
        }
    }
}
