use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    auth::{self, AuthUser},
    error::AppError,
    extract::ApiJson,
    models::{ErrorResponse, MessageResponse, NewUser, SignInRequest, SignUpRequest, UserProfile},
    validation,
};

/// sign_up
///
/// [Public Route] Creates a `CUSTOMER` or `OWNER` account. The password is
/// stored as a bcrypt hash.
#[utoipa::path(
    post,
    path = "/api/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Registered", body = MessageResponse),
        (status = 400, description = "Invalid nickname, password or type", body = ErrorResponse),
        (status = 409, description = "Nickname taken", body = ErrorResponse)
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignUpRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let request = validation::sign_up(payload)?;

    if state
        .repo
        .find_user_by_nickname(&request.nickname)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("nickname is already taken".to_string()));
    }

    let password = auth::hash_password(request.password).await?;
    let user = state
        .repo
        .create_user(NewUser {
            nickname: request.nickname,
            password,
            role: request.role,
        })
        .await?;

    tracing::info!(user_id = user.user_id, role = ?user.role, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("sign-up completed")),
    ))
}

/// sign_in
///
/// [Public Route] Verifies nickname and password and sets the `authorization`
/// cookie to `Bearer <token>`. Unknown nicknames and wrong passwords get the
/// same 401 answer.
#[utoipa::path(
    post,
    path = "/api/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in; sets the authorization cookie", body = MessageResponse),
        (status = 401, description = "Wrong nickname or password", body = ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<SignInRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    let (nickname, password) = validation::sign_in(payload)?;

    let user = state
        .repo
        .find_user_by_nickname(&nickname)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !auth::verify_password(password, user.password).await? {
        return Err(AppError::InvalidCredentials);
    }

    let token = auth::issue_token(user.user_id, &state.config)?;
    tracing::info!(user_id = user.user_id, "user signed in");

    Ok((
        jar.add(auth::auth_cookie(&token)),
        Json(MessageResponse::new("signed in")),
    ))
}

/// sign_out
///
/// [Public Route] Expires the `authorization` cookie. Tokens are not revoked
/// server-side.
#[utoipa::path(
    post,
    path = "/api/sign-out",
    responses((status = 200, description = "Cookie cleared", body = MessageResponse))
)]
pub async fn sign_out(jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(auth::removal_cookie()),
        Json(MessageResponse::new("signed out")),
    )
}

/// get_me
///
/// [Authenticated Route] Profile of the signed-in account. The identity is
/// placed in the request extensions by the authentication middleware.
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn get_me(Extension(user): Extension<AuthUser>) -> Json<UserProfile> {
    Json(UserProfile {
        user_id: user.id,
        nickname: user.nickname,
        role: user.role,
    })
}
