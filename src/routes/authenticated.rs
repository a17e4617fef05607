use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes for any signed-in account, regardless of role. The router is
/// wrapped in `auth_middleware`, which resolves the `AuthUser` once and stores
/// it in the request extensions, so handlers here read it with `Extension`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users/me
        // Profile of the account behind the session cookie.
        .route("/users/me", get(handlers::get_me))
}
