use crate::models::{MessageRow, NewUser, UserProfileRow, UserRow, UserSummaryRow};
use crate::Database;
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, Row};

/// Current server time as stored in timestamp columns.
/// Microsecond precision keeps successive logins strictly ordered.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    // -- Users --

    /// Insert a user with `join_at` set to now. Duplicate usernames surface as
    /// a constraint error; see [`crate::is_unique_violation`].
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "INSERT INTO users (username, password, first_name, last_name, phone, join_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING username, password, first_name, last_name, phone",
                rusqlite::params![
                    user.username,
                    user.password_hash,
                    user.first_name,
                    user.last_name,
                    user.phone,
                    now_timestamp(),
                ],
                |row| {
                    Ok(UserRow {
                        username: row.get(0)?,
                        password: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                        phone: row.get(4)?,
                    })
                },
            )?;
            Ok(row)
        })
    }

    pub fn get_password_hash(&self, username: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT password FROM users WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Set `last_login_at` to now. Returns the number of rows touched
    /// (0 when the username is unknown).
    pub fn touch_last_login(&self, username: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET last_login_at = ?1 WHERE username = ?2",
                (now_timestamp(), username),
            )?;
            Ok(changed)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT username, first_name, last_name, phone FROM users")?;

            let rows = stmt
                .query_map([], |row| summary_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_user_profile(&self, username: &str) -> Result<Option<UserProfileRow>> {
        self.with_conn(|conn| query_profile(conn, username))
    }

    // -- Messages --

    /// Messages sent by `username`, joined with their recipients.
    pub fn get_messages_from(&self, username: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                "SELECT m.id, m.body, m.sent_at, m.read_at,
                        u.username, u.first_name, u.last_name, u.phone
                 FROM messages AS m
                 JOIN users AS u ON m.to_username = u.username
                 WHERE m.from_username = ?1
                 ORDER BY m.id",
                username,
            )
        })
    }

    /// Messages received by `username`, joined with their senders.
    pub fn get_messages_to(&self, username: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                "SELECT m.id, m.body, m.sent_at, m.read_at,
                        u.username, u.first_name, u.last_name, u.phone
                 FROM messages AS m
                 JOIN users AS u ON m.from_username = u.username
                 WHERE m.to_username = ?1
                 ORDER BY m.id",
                username,
            )
        })
    }

    /// Store a message with `sent_at` set to now and return its id.
    pub fn insert_message(&self, from_username: &str, to_username: &str, body: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (from_username, to_username, body, sent_at) VALUES (?1, ?2, ?3, ?4)",
                (from_username, to_username, body, now_timestamp()),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }
}

fn summary_at(row: &Row<'_>, start: usize) -> rusqlite::Result<UserSummaryRow> {
    Ok(UserSummaryRow {
        username: row.get(start)?,
        first_name: row.get(start + 1)?,
        last_name: row.get(start + 2)?,
        phone: row.get(start + 3)?,
    })
}

fn query_profile(conn: &Connection, username: &str) -> Result<Option<UserProfileRow>> {
    let mut stmt = conn.prepare(
        "SELECT username, first_name, last_name, phone, join_at, last_login_at
         FROM users
         WHERE username = ?1",
    )?;

    stmt.query_row([username], |row| {
        Ok(UserProfileRow {
            username: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            phone: row.get(3)?,
            join_at: row.get(4)?,
            last_login_at: row.get(5)?,
        })
    })
    .optional()
}

fn query_messages(conn: &Connection, sql: &str, username: &str) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt
        .query_map([username], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                body: row.get(1)?,
                sent_at: row.get(2)?,
                read_at: row.get(3)?,
                peer: summary_at(row, 4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
