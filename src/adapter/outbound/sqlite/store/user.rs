use diesel::prelude::*;

use super::{from_json, parse_timestamp, timestamp, to_json, SqliteStore};
use crate::adapter::outbound::sqlite::database::model::UserRow;
use crate::adapter::outbound::sqlite::database::schema::users;
use crate::domain::{User, UserId};
use crate::error::Result;
use crate::port::outbound::store::UserStore;

pub(super) fn user_to_row(user: &User) -> Result<UserRow> {
    Ok(UserRow {
        id: user.id.to_string(),
        fullname: user.fullname.clone(),
        email: user.email.as_ref().map(|e| e.to_lowercase()),
        is_registered: user.is_registered,
        is_disabled: user.is_disabled,
        unclaimed_records: to_json(&user.unclaimed_records)?,
        created: timestamp(&user.created),
    })
}

pub(super) fn user_from_row(row: UserRow) -> Result<User> {
    Ok(User {
        id: UserId::from(row.id),
        fullname: row.fullname,
        email: row.email,
        is_registered: row.is_registered,
        is_disabled: row.is_disabled,
        unclaimed_records: from_json(&row.unclaimed_records)?,
        created: parse_timestamp(&row.created)?,
    })
}

impl UserStore for SqliteStore {
    async fn save_user(&self, user: &User) -> Result<()> {
        let row = user_to_row(user)?;
        let mut conn = self.conn()?;

        diesel::insert_into(users::table)
            .values(&row)
            .on_conflict(users::id)
            .do_update()
            .set(&row)
            .execute(&mut *conn)?;

        Ok(())
    }

    async fn user(&self, id: &UserId) -> Result<Option<User>> {
        let mut conn = self.conn()?;

        let row: Option<UserRow> = users::table
            .find(id.as_str())
            .first(&mut *conn)
            .optional()?;

        row.map(user_from_row).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut conn = self.conn()?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.trim().to_lowercase()))
            .first(&mut *conn)
            .optional()?;

        row.map(user_from_row).transpose()
    }
}
