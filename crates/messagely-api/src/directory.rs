use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, error, info};

use messagely_db::models::{MessageRow, NewUser, UserSummaryRow};
use messagely_db::{Database, is_unique_violation};
use messagely_types::api::RegisterRequest;
use messagely_types::models::{ReceivedMessage, SentMessage, UserProfile, UserSummary};

use crate::error::ApiError;
use crate::password::Hasher;

/// A freshly stored user, as returned by [`UserDirectory::register`].
/// `password` is the stored hash; it must not be sent to clients.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Maps usernames to profiles and message lists on top of the store.
/// Stateless apart from its handles; cheap to clone.
#[derive(Clone)]
pub struct UserDirectory {
    db: Arc<Database>,
    hasher: Hasher,
}

impl UserDirectory {
    pub fn new(db: Arc<Database>, hasher: Hasher) -> Self {
        Self { db, hasher }
    }

    /// Store a new user with a hashed password and `join_at` set to now.
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisteredUser, ApiError> {
        let db = self.db.clone();
        let hasher = self.hasher.clone();

        run_blocking(move || {
            let password_hash = hasher.hash(&req.password)?;

            let row = db
                .create_user(&NewUser {
                    username: &req.username,
                    password_hash: &password_hash,
                    first_name: &req.first_name,
                    last_name: &req.last_name,
                    phone: &req.phone,
                })
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        ApiError::Conflict(req.username.clone())
                    } else {
                        ApiError::Store(e)
                    }
                })?;

            info!("Registered user {}", row.username);
            Ok(RegisteredUser {
                username: row.username,
                password: row.password,
                first_name: row.first_name,
                last_name: row.last_name,
                phone: row.phone,
            })
        })
        .await
    }

    /// True iff the user exists and the password matches. An unknown
    /// username is `false`, same as a wrong password.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool, ApiError> {
        let db = self.db.clone();
        let hasher = self.hasher.clone();
        let username = username.to_string();
        let password = password.to_string();

        run_blocking(move || match db.get_password_hash(&username)? {
            Some(stored) => hasher.verify(&password, &stored),
            None => hasher.verify_unknown_user(&password),
        })
        .await
    }

    /// Set `last_login_at` to now. Unknown usernames are a no-op.
    pub async fn update_login_timestamp(&self, username: &str) -> Result<(), ApiError> {
        let db = self.db.clone();
        let username = username.to_string();

        run_blocking(move || {
            if db.touch_last_login(&username)? == 0 {
                debug!("Login timestamp not updated: no user {}", username);
            }
            Ok(())
        })
        .await
    }

    pub async fn all(&self) -> Result<Vec<UserSummary>, ApiError> {
        let db = self.db.clone();
        let rows = run_blocking(move || Ok(db.list_users()?)).await?;
        Ok(rows.into_iter().map(to_summary).collect())
    }

    pub async fn get(&self, username: &str) -> Result<UserProfile, ApiError> {
        let db = self.db.clone();
        let name = username.to_string();
        let row = run_blocking(move || Ok(db.get_user_profile(&name)?))
            .await?
            .ok_or_else(|| ApiError::NotFound(username.to_string()))?;

        Ok(UserProfile {
            join_at: parse_timestamp(&row.join_at)?,
            last_login_at: row.last_login_at.as_deref().map(parse_timestamp).transpose()?,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
        })
    }

    /// Messages sent by `username`, each carrying its recipient as `to_user`.
    pub async fn messages_from(&self, username: &str) -> Result<Vec<SentMessage>, ApiError> {
        let db = self.db.clone();
        let username = username.to_string();
        let rows = run_blocking(move || Ok(db.get_messages_from(&username)?)).await?;

        rows.into_iter()
            .map(|row| -> Result<SentMessage, ApiError> {
                let (sent_at, read_at) = message_times(&row)?;
                Ok(SentMessage {
                    id: row.id,
                    to_user: to_summary(row.peer),
                    body: row.body,
                    sent_at,
                    read_at,
                })
            })
            .collect()
    }

    /// Messages received by `username`, each carrying its sender as `from_user`.
    pub async fn messages_to(&self, username: &str) -> Result<Vec<ReceivedMessage>, ApiError> {
        let db = self.db.clone();
        let username = username.to_string();
        let rows = run_blocking(move || Ok(db.get_messages_to(&username)?)).await?;

        rows.into_iter()
            .map(|row| -> Result<ReceivedMessage, ApiError> {
                let (sent_at, read_at) = message_times(&row)?;
                Ok(ReceivedMessage {
                    id: row.id,
                    from_user: to_summary(row.peer),
                    body: row.body,
                    sent_at,
                    read_at,
                })
            })
            .collect()
    }
}

/// Run store access or hashing off the async runtime.
async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal("Background task failed".into())
    })?
}

fn to_summary(row: UserSummaryRow) -> UserSummary {
    UserSummary {
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        phone: row.phone,
    }
}

type MessageTimes = (DateTime<Utc>, Option<DateTime<Utc>>);

fn message_times(row: &MessageRow) -> Result<MessageTimes, ApiError> {
    Ok((
        parse_timestamp(&row.sent_at)?,
        row.read_at.as_deref().map(parse_timestamp).transpose()?,
    ))
}

/// Stored timestamps that fail to parse are a store error, not a default date.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through sqlite3 use datetime('now'): no zone, UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| ApiError::Store(anyhow::anyhow!("Corrupt timestamp '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::cheap_hasher;

    fn directory() -> (UserDirectory, Arc<Database>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        (UserDirectory::new(db.clone(), cheap_hasher()), db)
    }

    fn request(username: &str, password: &str, first_name: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            password: password.into(),
            first_name: first_name.into(),
            last_name: "X".into(),
            phone: "555".into(),
        }
    }

    #[tokio::test]
    async fn register_then_get() {
        let (dir, _) = directory();
        let stored = dir.register(request("amy", "pw1", "Amy")).await.unwrap();
        assert_eq!(stored.username, "amy");
        assert_ne!(stored.password, "pw1");

        let profile = dir.get("amy").await.unwrap();
        assert_eq!(profile.first_name, "Amy");
        assert_eq!(profile.last_name, "X");
        assert_eq!(profile.phone, "555");
        assert!(profile.join_at > DateTime::<Utc>::default());
        assert!(profile.last_login_at.is_none());
    }

    #[tokio::test]
    async fn authenticate_outcomes() {
        let (dir, _) = directory();
        dir.register(request("amy", "pw1", "Amy")).await.unwrap();

        assert!(dir.authenticate("amy", "pw1").await.unwrap());
        assert!(!dir.authenticate("amy", "wrong").await.unwrap());
        assert!(!dir.authenticate("nobody", "pw1").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_register_conflicts() {
        let (dir, _) = directory();
        dir.register(request("amy", "pw1", "Amy")).await.unwrap();

        let err = dir.register(request("amy", "pw2", "Other")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref name) if name == "amy"));

        assert_eq!(dir.get("amy").await.unwrap().first_name, "Amy");
        assert!(dir.authenticate("amy", "pw1").await.unwrap());
        assert!(!dir.authenticate("amy", "pw2").await.unwrap());
    }

    #[tokio::test]
    async fn login_timestamp_increases() {
        let (dir, _) = directory();
        dir.register(request("amy", "pw1", "Amy")).await.unwrap();

        dir.update_login_timestamp("amy").await.unwrap();
        let first = dir.get("amy").await.unwrap().last_login_at.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        dir.update_login_timestamp("amy").await.unwrap();
        let second = dir.get("amy").await.unwrap().last_login_at.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn update_login_for_unknown_user_is_noop() {
        let (dir, _) = directory();
        dir.update_login_timestamp("ghost").await.unwrap();
        assert!(matches!(dir.get("ghost").await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn all_lists_users() {
        let (dir, _) = directory();
        assert!(dir.all().await.unwrap().is_empty());

        dir.register(request("amy", "pw1", "Amy")).await.unwrap();
        dir.register(request("bob", "pw2", "Bob")).await.unwrap();

        let mut names: Vec<String> = dir.all().await.unwrap().into_iter().map(|u| u.username).collect();
        names.sort();
        assert_eq!(names, vec!["amy", "bob"]);
    }

    #[tokio::test]
    async fn message_directions() {
        let (dir, db) = directory();
        dir.register(request("amy", "pw1", "Amy")).await.unwrap();
        dir.register(request("bob", "pw2", "Bob")).await.unwrap();
        dir.register(request("cat", "pw3", "Cat")).await.unwrap();

        db.insert_message("amy", "bob", "amy to bob").unwrap();
        db.insert_message("bob", "amy", "bob to amy").unwrap();
        db.insert_message("cat", "amy", "cat to amy").unwrap();

        let sent = dir.messages_from("amy").await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "amy to bob");
        assert_eq!(
            sent[0].to_user,
            UserSummary {
                username: "bob".into(),
                first_name: "Bob".into(),
                last_name: "X".into(),
                phone: "555".into(),
            }
        );
        assert!(sent[0].read_at.is_none());

        let received = dir.messages_to("amy").await.unwrap();
        let senders: Vec<&str> = received.iter().map(|m| m.from_user.username.as_str()).collect();
        assert_eq!(senders, vec!["bob", "cat"]);
        assert_eq!(received[1].from_user.first_name, "Cat");

        assert!(dir.messages_from("nobody").await.unwrap().is_empty());
    }

    #[test]
    fn parses_sqlite_datetime_format() {
        let ts = parse_timestamp("2024-01-02 03:04:05").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert!(matches!(parse_timestamp("garbage"), Err(ApiError::Store(_))));
    }

    #[tokio::test]
    async fn corrupt_timestamps_surface_as_store_errors() {
        let (dir, db) = directory();
        dir.register(request("amy", "pw1", "Amy")).await.unwrap();
        dir.register(request("bob", "pw2", "Bob")).await.unwrap();
        db.insert_message("amy", "bob", "hi").unwrap();

        db.with_conn(|conn| {
            conn.execute_batch(
                "UPDATE users SET join_at = 'not a date' WHERE username = 'amy';
                 UPDATE messages SET read_at = 'yesterday-ish';",
            )?;
            Ok(())
        })
        .unwrap();

        assert!(matches!(dir.get("amy").await, Err(ApiError::Store(_))));
        assert!(matches!(dir.messages_from("amy").await, Err(ApiError::Store(_))));
        assert!(matches!(dir.messages_to("bob").await, Err(ApiError::Store(_))));
        assert_eq!(dir.get("bob").await.unwrap().first_name, "Bob");
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let (dir, db) = directory();
        dir.register(request("amy", "pw1", "Amy")).await.unwrap();

        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE messages; DROP TABLE users;")?;
            Ok(())
        })
        .unwrap();

        assert!(matches!(dir.all().await, Err(ApiError::Store(_))));
        assert!(matches!(dir.get("amy").await, Err(ApiError::Store(_))));
        assert!(matches!(dir.authenticate("amy", "pw1").await, Err(ApiError::Store(_))));
        assert!(matches!(dir.messages_from("amy").await, Err(ApiError::Store(_))));
        assert!(matches!(dir.messages_to("amy").await, Err(ApiError::Store(_))));
        assert!(matches!(dir.update_login_timestamp("amy").await, Err(ApiError::Store(_))));
        assert!(matches!(
            dir.register(request("bob", "pw2", "Bob")).await,
            Err(ApiError::Store(_))
        ));
    }

    #[tokio::test]
    async fn unknown_user_authentication_still_hashes() {
        let (dir, _) = directory();
        assert!(!dir.authenticate("ghost", "").await.unwrap());
        assert!(!dir.authenticate("ghost", "pw1").await.unwrap());
    }
}
