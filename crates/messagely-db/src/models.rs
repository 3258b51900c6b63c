//! Database row types. These map directly to SQLite rows and keep
//! timestamps as stored text; conversion to API models happens upstream.

/// Row returned by user insertion. Carries the password hash.
pub struct UserRow {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

pub struct UserSummaryRow {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

pub struct UserProfileRow {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: String,
    pub last_login_at: Option<String>,
}

/// A message joined with the user on the other end of it: the recipient
/// for outgoing messages, the sender for incoming ones.
pub struct MessageRow {
    pub id: i64,
    pub body: String,
    pub sent_at: String,
    pub read_at: Option<String>,
    pub peer: UserSummaryRow,
}

/// Fields of a user being inserted.
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: &'a str,
}
