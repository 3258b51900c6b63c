use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public slice of a user, used in listings and embedded in messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Full profile as returned by `GET /users/{username}`.
/// The password hash is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// A message seen from its sender's side: the recipient is embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: i64,
    pub to_user: UserSummary,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// A message seen from its recipient's side: the sender is embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub id: i64,
    pub from_user: UserSummary,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_without_login_serializes_null() {
        let profile = UserProfile {
            username: "amy".into(),
            first_name: "Amy".into(),
            last_name: "X".into(),
            phone: "555".into(),
            join_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            last_login_at: None,
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["username"], "amy");
        assert_eq!(json["join_at"], "2023-11-14T22:13:20Z");
        assert!(json["last_login_at"].is_null());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn sent_message_nests_recipient() {
        let msg = SentMessage {
            id: 7,
            to_user: UserSummary {
                username: "bob".into(),
                first_name: "Bob".into(),
                last_name: "Y".into(),
                phone: "556".into(),
            },
            body: "hi".into(),
            sent_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            read_at: None,
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["to_user"]["username"], "bob");
        assert_eq!(json["id"], 7);
        assert!(json.get("from_user").is_none());
    }
}
