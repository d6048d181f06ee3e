//! Error types for the session layer and route table construction.

use thiserror::Error;

/// Failures of the Session Provider. The guard maps every variant to a login redirect.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid access token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("session provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("role lookup query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("session provider did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("session provider unavailable: {0}")]
    Unavailable(String),
}

/// Rejections raised while assembling a `RouteTable`.
#[derive(Debug, Error, PartialEq)]
pub enum RouteTableError {
    #[error("duplicate route name `{0}`")]
    DuplicateName(String),

    #[error("duplicate route path `{0}`")]
    DuplicatePath(String),

    #[error("login route `{0}` is not declared")]
    MissingLogin(String),

    #[error("route `{0}` declares allowed roles but does not require authentication")]
    RolesWithoutAuth(String),

    #[error("top-level route `{0}` must start with `/`")]
    RelativePath(String),
}
