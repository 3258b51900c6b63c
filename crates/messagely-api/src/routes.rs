use axum::{
    Router,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::users;

/// Every route the service exposes. Cross-cutting layers (tracing, CORS)
/// are added by the binary.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let user_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{username}", get(users::get_user))
        .route("/users/{username}/to", get(users::messages_to))
        .route("/users/{username}/from", get(users::messages_from));

    Router::new()
        .merge(auth_routes)
        .merge(user_routes)
        .with_state(state)
}
