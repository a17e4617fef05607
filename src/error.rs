//! Error types and HTTP response shaping.
//!
//! Every handler returns `Result<_, AppError>`. The `IntoResponse` impl is the
//! single place where failures become status codes and `{ "errorMessage": ... }`
//! bodies, so handlers never build error responses inline.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;

use crate::{auth, models::ErrorResponse, repository::RepositoryError};

/// Failures of the cookie-carried credential.
///
/// All of them answer 401 and clear the `authorization` cookie.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Cookie absent, or not of the form `Bearer <token>`.
    #[error("the authorization cookie is missing or malformed")]
    MalformedCredential,

    /// Signature valid but `exp` is in the past.
    #[error("token expired")]
    TokenExpired,

    /// Bad signature, unparsable token or subject.
    #[error("token verification failed")]
    TokenInvalid,

    /// The token names a user that no longer exists.
    #[error("token user does not exist")]
    UnknownSubject,
}

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed, missing or out-of-range input. 400.
    #[error("{0}")]
    Validation(String),

    /// Referenced category or menu does not exist. 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate nickname at sign-up. 409.
    #[error("{0}")]
    Conflict(String),

    /// Credential missing, invalid or expired. 401 with the cookie cleared.
    #[error(transparent)]
    Unauthenticated(#[from] AuthError),

    /// Sign-in with an unknown nickname or a wrong password. 401.
    ///
    /// One message for both cases so responses do not reveal which nicknames exist.
    #[error("check your nickname or password")]
    InvalidCredentials,

    /// Authenticated, but the account is not an `OWNER`.
    ///
    /// Answered with 400 rather than 403; existing clients rely on it.
    #[error("only owners can perform this action")]
    NotOwner,

    /// Persistence failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The store failed while resolving a session's user. 500, and the
    /// cookie is cleared like any other failed credential check.
    #[error("credential lookup failed: {0}")]
    CredentialLookup(RepositoryError),

    /// Any other unexpected failure. The message is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// HTTP status this error is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::NotOwner => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthenticated(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Repository(RepositoryError::DuplicateNickname) => StatusCode::CONFLICT,
            Self::Repository(_) | Self::CredentialLookup(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

fn clear_credential() -> CookieJar {
    CookieJar::default().add(auth::removal_cookie())
}

fn error_body(message: impl Into<String>) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error_message: message.into(),
    })
}

/// Converts application errors into HTTP responses.
///
/// Server-side failures are logged with full detail and answered with a generic
/// message. Credential failures additionally expire the `authorization` cookie
/// so the client stops presenting it.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Unauthenticated(err) => {
                tracing::debug!("rejected credential: {}", err);
                (status, clear_credential(), error_body(err.to_string())).into_response()
            }
            Self::CredentialLookup(err) => {
                tracing::error!("credential lookup failed: {:?}", err);
                (
                    status,
                    clear_credential(),
                    error_body("an error occurred on the server"),
                )
                    .into_response()
            }
            Self::Repository(RepositoryError::DuplicateNickname) => {
                (status, error_body("nickname is already taken")).into_response()
            }
            Self::Repository(err) => {
                tracing::error!("repository error: {:?}", err);
                (status, error_body("an error occurred on the server")).into_response()
            }
            Self::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (status, error_body("an error occurred on the server")).into_response()
            }
            other => (status, error_body(other.to_string())).into_response(),
        }
    }
}
