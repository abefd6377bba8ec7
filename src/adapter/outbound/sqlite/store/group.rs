use diesel::prelude::*;

use super::node::node_from_row;
use super::user::user_from_row;
use super::{from_json, parse_timestamp, timestamp, to_json, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::{
    GroupLogRow, GroupRow, MembershipRow, NewGroupLogRow, NodePermissionRow, NodeRow, UserRow,
};
use crate::adapter::outbound::sqlite::database::schema::{
    nodes, osf_group_logs, osf_group_memberships, osf_group_node_permissions, osf_groups, users,
};
use crate::domain::{
    Group, GroupId, GroupLog, GroupRole, Membership, Node, NodeId, NodePermission, Roster, UserId,
};
use crate::error::{Error, Result};
use crate::port::outbound::store::GroupStore;

fn group_from_row(row: GroupRow) -> Result<Group> {
    Ok(Group {
        id: GroupId::from(row.id),
        name: row.name,
        creator_id: row.creator_id.map(UserId::from),
        created: parse_timestamp(&row.created)?,
        modified: parse_timestamp(&row.modified)?,
    })
}

fn log_from_row(row: GroupLogRow) -> Result<GroupLog> {
    Ok(GroupLog {
        id: Some(row.id),
        group_id: GroupId::from(row.group_id),
        action: row.action.parse().map_err(Error::Parse)?,
        user_id: row.user_id.map(UserId::from),
        params: from_json(&row.params)?,
        created: parse_timestamp(&row.created)?,
    })
}

impl GroupStore for SqliteStore {
    async fn save_group(&self, group: &Group) -> Result<()> {
        let row = GroupRow {
            id: group.id.to_string(),
            name: group.name.clone(),
            creator_id: group.creator_id.as_ref().map(ToString::to_string),
            created: timestamp(&group.created),
            modified: timestamp(&group.modified),
        };
        let mut conn = self.conn()?;

        diesel::insert_into(osf_groups::table)
            .values(&row)
            .on_conflict(osf_groups::id)
            .do_update()
            .set(&row)
            .execute(&mut *conn)?;

        Ok(())
    }

    async fn group(&self, id: &GroupId) -> Result<Option<Group>> {
        let mut conn = self.conn()?;

        let row: Option<GroupRow> = osf_groups::table
            .find(id.as_str())
            .first(&mut *conn)
            .optional()?;

        row.map(group_from_row).transpose()
    }

    async fn delete_group(&self, id: &GroupId) -> Result<bool> {
        let mut conn = self.conn()?;

        let deleted = diesel::delete(osf_groups::table.find(id.as_str())).execute(&mut *conn)?;

        Ok(deleted > 0)
    }

    async fn groups_for_user(&self, user_id: &UserId) -> Result<Vec<Group>> {
        let mut conn = self.conn()?;

        let rows: Vec<GroupRow> = osf_groups::table
            .inner_join(osf_group_memberships::table)
            .filter(osf_group_memberships::user_id.eq(user_id.as_str()))
            .select(GroupRow::as_select())
            .order(osf_groups::name.asc())
            .load(&mut *conn)?;

        rows.into_iter().map(group_from_row).collect()
    }

    async fn roster(&self, group_id: &GroupId) -> Result<Roster> {
        let mut conn = self.conn()?;

        let rows: Vec<(MembershipRow, UserRow)> = osf_group_memberships::table
            .inner_join(users::table)
            .filter(osf_group_memberships::group_id.eq(group_id.as_str()))
            .select((MembershipRow::as_select(), UserRow::as_select()))
            .order(users::created.asc())
            .load(&mut *conn)?;

        let memberships = rows
            .into_iter()
            .map(|(membership, user)| {
                Ok(Membership {
                    user: user_from_row(user)?,
                    role: membership.role.parse()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Roster::new(memberships))
    }

    async fn set_role(&self, group_id: &GroupId, user_id: &UserId, role: GroupRole) -> Result<()> {
        let row = MembershipRow {
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            role: role.as_str().to_string(),
        };
        let mut conn = self.conn()?;

        diesel::insert_into(osf_group_memberships::table)
            .values(&row)
            .on_conflict((osf_group_memberships::group_id, osf_group_memberships::user_id))
            .do_update()
            .set(osf_group_memberships::role.eq(&row.role))
            .execute(&mut *conn)?;

        Ok(())
    }

    async fn remove_membership(&self, group_id: &GroupId, user_id: &UserId) -> Result<bool> {
        let mut conn = self.conn()?;

        let deleted = diesel::delete(
            osf_group_memberships::table
                .filter(osf_group_memberships::group_id.eq(group_id.as_str()))
                .filter(osf_group_memberships::user_id.eq(user_id.as_str())),
        )
        .execute(&mut *conn)?;

        Ok(deleted > 0)
    }

    async fn node_permissions(
        &self,
        group_id: &GroupId,
        node_id: &NodeId,
    ) -> Result<Vec<NodePermission>> {
        let mut conn = self.conn()?;

        let rows: Vec<String> = osf_group_node_permissions::table
            .filter(osf_group_node_permissions::group_id.eq(group_id.as_str()))
            .filter(osf_group_node_permissions::node_id.eq(node_id.as_str()))
            .select(osf_group_node_permissions::permission)
            .load(&mut *conn)?;

        let mut perms = rows
            .iter()
            .map(|p| p.parse().map_err(Error::from))
            .collect::<Result<Vec<NodePermission>>>()?;
        perms.sort();
        Ok(perms)
    }

    async fn set_node_permissions(
        &self,
        group_id: &GroupId,
        node_id: &NodeId,
        permissions: &[NodePermission],
    ) -> Result<()> {
        let rows: Vec<NodePermissionRow> = permissions
            .iter()
            .map(|p| NodePermissionRow {
                group_id: group_id.to_string(),
                node_id: node_id.to_string(),
                permission: p.as_str().to_string(),
            })
            .collect();
        let mut conn = self.conn()?;

        conn.transaction::<_, Error, _>(|conn| {
            diesel::delete(
                osf_group_node_permissions::table
                    .filter(osf_group_node_permissions::group_id.eq(group_id.as_str()))
                    .filter(osf_group_node_permissions::node_id.eq(node_id.as_str())),
            )
            .execute(conn)?;
            diesel::insert_into(osf_group_node_permissions::table)
                .values(&rows)
                .execute(conn)?;
            Ok(())
        })
    }

    async fn remove_node_permissions(&self, group_id: &GroupId, node_id: &NodeId) -> Result<usize> {
        let mut conn = self.conn()?;

        let deleted = diesel::delete(
            osf_group_node_permissions::table
                .filter(osf_group_node_permissions::group_id.eq(group_id.as_str()))
                .filter(osf_group_node_permissions::node_id.eq(node_id.as_str())),
        )
        .execute(&mut *conn)?;

        Ok(deleted)
    }

    async fn group_nodes(&self, group_id: &GroupId) -> Result<Vec<Node>> {
        let mut conn = self.conn()?;

        let rows: Vec<NodeRow> = nodes::table
            .inner_join(osf_group_node_permissions::table)
            .filter(osf_group_node_permissions::group_id.eq(group_id.as_str()))
            .filter(osf_group_node_permissions::permission.eq(NodePermission::ReadNode.as_str()))
            .select(NodeRow::as_select())
            .order(nodes::created.asc())
            .load(&mut *conn)?;

        rows.into_iter().map(node_from_row).collect()
    }

    async fn add_group_log(&self, log: &GroupLog) -> Result<()> {
        let row = NewGroupLogRow {
            group_id: log.group_id.to_string(),
            action: log.action.as_str().to_string(),
            user_id: log.user_id.as_ref().map(ToString::to_string),
            params: to_json(&log.params)?,
            created: timestamp(&log.created),
        };
        let mut conn = self.conn()?;

        diesel::insert_into(osf_group_logs::table)
            .values(&row)
            .execute(&mut *conn)?;

        Ok(())
    }

    async fn group_logs(&self, group_id: &GroupId) -> Result<Vec<GroupLog>> {
        let mut conn = self.conn()?;

        let rows: Vec<GroupLogRow> = osf_group_logs::table
            .filter(osf_group_logs::group_id.eq(group_id.as_str()))
            .order(osf_group_logs::id.asc())
            .load(&mut *conn)?;

        rows.into_iter().map(log_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::testkit::store::memory_store;
    use super::*;
    use crate::domain::{GroupLogAction, Permission, User};
    use crate::port::outbound::store::{NodeStore, UserStore};

    async fn seeded() -> (SqliteStore, Group, User, User) {
        let store = memory_store();
        let alice = User::registered("Alice", "alice@example.com");
        let bob = User::registered("Bob", "bob@example.com");
        store.save_user(&alice).await.unwrap();
        store.save_user(&bob).await.unwrap();
        let group = Group::new("Lab", Some(alice.id.clone()));
        store.save_group(&group).await.unwrap();
        (store, group, alice, bob)
    }

    #[tokio::test]
    async fn roles_upsert_and_roster_reflects_them() {
        let (store, group, alice, bob) = seeded().await;
        store.set_role(&group.id, &alice.id, GroupRole::Manager).await.unwrap();
        store.set_role(&group.id, &bob.id, GroupRole::Manager).await.unwrap();
        store.set_role(&group.id, &bob.id, GroupRole::Member).await.unwrap();

        let roster = store.roster(&group.id).await.unwrap();
        assert_eq!(roster.memberships.len(), 2);
        assert!(roster.is_manager(&alice.id));
        assert!(roster.is_member(&bob.id));
        assert!(!roster.is_manager(&bob.id));

        assert!(store.remove_membership(&group.id, &bob.id).await.unwrap());
        assert!(!store.remove_membership(&group.id, &bob.id).await.unwrap());

        let groups = store.groups_for_user(&alice.id).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, group.id);
        assert!(store.groups_for_user(&bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn node_permissions_replace_and_list_nodes() {
        let (store, group, _, _) = seeded().await;
        let node = Node::new("Project");
        store.save_node(&node).await.unwrap();

        store
            .set_node_permissions(&group.id, &node.id, Permission::Admin.node_permissions())
            .await
            .unwrap();
        assert_eq!(store.node_permissions(&group.id, &node.id).await.unwrap().len(), 3);

        store
            .set_node_permissions(&group.id, &node.id, Permission::Read.node_permissions())
            .await
            .unwrap();
        assert_eq!(
            store.node_permissions(&group.id, &node.id).await.unwrap(),
            vec![NodePermission::ReadNode]
        );
        assert_eq!(store.group_nodes(&group.id).await.unwrap()[0].id, node.id);

        assert_eq!(store.remove_node_permissions(&group.id, &node.id).await.unwrap(), 1);
        assert!(store.group_nodes(&group.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_group_cascades() {
        let (store, group, alice, _) = seeded().await;
        store.set_role(&group.id, &alice.id, GroupRole::Manager).await.unwrap();
        store
            .add_group_log(&GroupLog::new(
                group.id.clone(),
                GroupLogAction::GroupCreated,
                Some(alice.id.clone()),
                Default::default(),
            ))
            .await
            .unwrap();
        assert_eq!(store.group_logs(&group.id).await.unwrap().len(), 1);

        assert!(store.delete_group(&group.id).await.unwrap());
        assert!(store.group(&group.id).await.unwrap().is_none());
        assert!(store.roster(&group.id).await.unwrap().memberships.is_empty());
        assert!(store.group_logs(&group.id).await.unwrap().is_empty());
        assert!(!store.delete_group(&group.id).await.unwrap());
    }

}
