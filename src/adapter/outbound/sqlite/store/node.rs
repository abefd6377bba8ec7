use diesel::prelude::*;

use super::{from_json, parse_timestamp, timestamp, to_json, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::{NewNodeLogRow, NodeLogRow, NodeRow};
use crate::adapter::outbound::sqlite::database::schema::{node_logs, nodes};
use crate::domain::{Node, NodeId, NodeLog, UserId};
use crate::error::Result;
use crate::port::outbound::store::NodeStore;

pub(super) fn node_from_row(row: NodeRow) -> Result<Node> {
    Ok(Node {
        id: NodeId::from(row.id),
        title: row.title,
        category: row.category,
        parent_id: row.parent_id.map(NodeId::from),
        created: parse_timestamp(&row.created)?,
    })
}

fn log_from_row(row: NodeLogRow) -> Result<NodeLog> {
    Ok(NodeLog {
        id: Some(row.id),
        node_id: NodeId::from(row.node_id),
        action: row.action,
        user_id: row.user_id.map(UserId::from),
        params: from_json(&row.params)?,
        created: parse_timestamp(&row.created)?,
    })
}

impl NodeStore for SqliteStore {
    async fn save_node(&self, node: &Node) -> Result<()> {
        let row = NodeRow {
            id: node.id.to_string(),
            title: node.title.clone(),
            category: node.category.clone(),
            parent_id: node.parent_id.as_ref().map(ToString::to_string),
            created: timestamp(&node.created),
        };
        let mut conn = self.conn()?;

        diesel::insert_into(nodes::table)
            .values(&row)
            .on_conflict(nodes::id)
            .do_update()
            .set(&row)
            .execute(&mut *conn)?;

        Ok(())
    }

    async fn node(&self, id: &NodeId) -> Result<Option<Node>> {
        let mut conn = self.conn()?;

        let row: Option<NodeRow> = nodes::table
            .find(id.as_str())
            .first(&mut *conn)
            .optional()?;

        row.map(node_from_row).transpose()
    }

    async fn add_node_log(&self, log: &NodeLog) -> Result<()> {
        let row = NewNodeLogRow {
            node_id: log.node_id.to_string(),
            action: log.action.clone(),
            user_id: log.user_id.as_ref().map(ToString::to_string),
            params: to_json(&log.params)?,
            created: timestamp(&log.created),
        };
        let mut conn = self.conn()?;

        diesel::insert_into(node_logs::table)
            .values(&row)
            .execute(&mut *conn)?;

        Ok(())
    }

    async fn node_logs(&self, node_id: &NodeId) -> Result<Vec<NodeLog>> {
        let mut conn = self.conn()?;

        let rows: Vec<NodeLogRow> = node_logs::table
            .filter(node_logs::node_id.eq(node_id.as_str()))
            .order(node_logs::id.asc())
            .load(&mut *conn)?;

        rows.into_iter().map(log_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::testkit::store::memory_store;
    use super::*;
    use crate::log_params;

    #[tokio::test]
    async fn component_keeps_parent() {
        let store = memory_store();
        let project = Node::new("Project");
        let component = Node::component("Data", &project.id);
        store.save_node(&project).await.unwrap();
        store.save_node(&component).await.unwrap();

        let loaded = store.node(&component.id).await.unwrap().unwrap();
        assert_eq!(loaded.parent_id.as_ref(), Some(&project.id));
        assert_eq!(loaded.project_or_component(), "component");
    }

    #[tokio::test]
    async fn logs_come_back_in_insertion_order() {
        let store = memory_store();
        let node = Node::new("Project");
        store.save_node(&node).await.unwrap();

        for action in ["group_added", "group_updated", "group_removed"] {
            let log = NodeLog::new(node.id.clone(), action, None, log_params! { "node" => node.id });
            store.add_node_log(&log).await.unwrap();
        }

        let logs = store.node_logs(&node.id).await.unwrap();
        let actions: Vec<_> = logs.iter().map(|l| l.action.as_str()).collect();
        assert_eq!(actions, vec!["group_added", "group_updated", "group_removed"]);
        assert_eq!(logs[0].params["node"], serde_json::json!(node.id));
    }

    #[tokio::test]
    async fn log_for_unknown_node_is_rejected() {
        let store = memory_store();
        let log = NodeLog::new(NodeId::new("ghost"), "group_added", None, Default::default());
        assert!(store.add_node_log(&log).await.is_err());
    }
}
