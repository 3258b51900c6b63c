pub mod auth;
pub mod directory;
pub mod error;
pub mod password;
pub mod routes;
pub mod token;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use directory::UserDirectory;
pub use error::ApiError;
pub use password::Hasher;
pub use routes::router;
pub use token::TokenIssuer;
