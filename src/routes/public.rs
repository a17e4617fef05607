use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Public Router Module
///
/// The account gateway. None of these endpoints read the `authorization`
/// cookie; sign-in sets it and sign-out expires it.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // POST /sign-up
        // Nickname, password and account type (`CUSTOMER` by default).
        .route("/sign-up", post(handlers::sign_up))
        // POST /sign-in
        // Issues the session token as an HttpOnly cookie.
        .route("/sign-in", post(handlers::sign_in))
        .route("/sign-out", post(handlers::sign_out))
}
