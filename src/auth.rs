use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    config::AppConfig,
    error::{AppError, AuthError},
    models::Role,
    repository::RepositoryState,
};

/// Name of the cookie carrying the session credential.
pub const AUTH_COOKIE: &str = "authorization";

/// Work factor for password hashing.
pub const BCRYPT_COST: u32 = 10;

/// Claims
///
/// Payload of the session token. `sub` is the user id as a string, per RFC 7519.
/// `exp` is only present when the server is configured with a token lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub nickname: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

/// Owner
///
/// An `AuthUser` whose role is `OWNER`. Using it as a handler argument gates
/// the handler: other roles are rejected with 400 before the body is read.
#[derive(Debug, Clone)]
pub struct Owner(pub AuthUser);

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// issue_token
///
/// Signs a session token for `user_id` with the configured secret.
pub fn issue_token(user_id: i64, config: &AppConfig) -> Result<String, AppError> {
    let iat = now_secs();
    let claims = Claims {
        sub: user_id.to_string(),
        iat,
        exp: config.token_ttl.map(|ttl| iat.saturating_add(ttl.as_secs())),
    };
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
}

/// verify_token
///
/// Checks signature and, when present, expiry. Returns the decoded claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Tokens issued without a lifetime carry no `exp`; it is still enforced when present.
    validation.required_spec_claims.clear();
    validation.validate_exp = true;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })
}

fn cookie_base(value: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie storing a freshly issued token as `Bearer <token>`. The space is
/// percent-encoded when the jar writes the `Set-Cookie` header.
pub fn auth_cookie(token: &str) -> Cookie<'static> {
    cookie_base(format!("Bearer {token}"))
}

/// Cookie that expires the stored credential.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = cookie_base(String::new());
    cookie.make_removal();
    cookie
}

/// Decoded value of the credential cookie, with RFC 6265 quotes removed.
fn read_credential(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|cookie| cookie.value_trimmed().to_string())
}

/// Splits `Bearer <token>` into the token, rejecting anything else.
fn bearer_token(credential: &str) -> Result<&str, AuthError> {
    let mut parts = credential.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedCredential),
    }
}

pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to verify password: {e}")))
}

/// AuthUser Extractor Implementation
///
/// 1. Reads the `authorization` cookie and requires `Bearer <token>`.
/// 2. Verifies the token with the configured secret.
/// 3. Resolves `sub` to a stored user.
///
/// Rejection: `AppError::Unauthenticated`, answered with 401 and a cookie-clearing
/// `Set-Cookie`. If a middleware already resolved the user, the cached identity
/// from the request extensions is returned.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let credential = read_credential(&parts.headers).ok_or(AuthError::MalformedCredential)?;
        let token = bearer_token(&credential)?;
        let claims = verify_token(token, &config.jwt_secret)?;
        let user_id: i64 = claims.sub.parse().map_err(|_| AuthError::TokenInvalid)?;

        let user = repo
            .get_user(user_id)
            .await
            .map_err(AppError::CredentialLookup)?
            .ok_or(AuthError::UnknownSubject)?;

        let auth_user = AuthUser {
            id: user.user_id,
            nickname: user.nickname,
            role: user.role,
        };
        parts.extensions.insert(auth_user.clone());
        Ok(auth_user)
    }
}

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_owner() {
            tracing::debug!(user_id = user.id, "non-owner attempted a catalog mutation");
            return Err(AppError::NotOwner);
        }
        Ok(Owner(user))
    }
}
