use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use fleet_console::{
    auth::{AccessToken, Claims, SessionDecoder},
    error::SessionError,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::SystemTime;
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_AUDIENCE: &str = "authenticated";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token(secret: &str, audience: &str, exp: u64) -> String {
    let claims = Claims {
        sub: TEST_USER_ID,
        iat: now() as usize,
        exp: exp as usize,
        aud: audience.to_string(),
        email: Some("fleet@example.com".to_string()),
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn decoder() -> SessionDecoder {
    SessionDecoder::new(TEST_JWT_SECRET, TEST_AUDIENCE)
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

// --- SessionDecoder ---

#[test]
fn test_valid_token_yields_session() {
    let token = create_token(TEST_JWT_SECRET, TEST_AUDIENCE, now() + 3600);

    let session = decoder().decode(Some(&token)).unwrap().unwrap();

    assert_eq!(session.user.id, TEST_USER_ID);
    assert_eq!(session.user.email.as_deref(), Some("fleet@example.com"));
    assert!(session.expires_at > chrono::Utc::now());
}

#[test]
fn test_missing_token_is_no_session() {
    assert!(decoder().decode(None).unwrap().is_none());
}

#[test]
fn test_expired_token_is_no_session() {
    // Well past the default validation leeway.
    let token = create_token(TEST_JWT_SECRET, TEST_AUDIENCE, now() - 3600);
    assert!(decoder().decode(Some(&token)).unwrap().is_none());
}

#[test]
fn test_wrong_signature_is_an_error() {
    let token = create_token("some-other-secret", TEST_AUDIENCE, now() + 3600);
    let result = decoder().decode(Some(&token));
    assert!(matches!(result, Err(SessionError::InvalidToken(_))));
}

#[test]
fn test_wrong_audience_is_an_error() {
    let token = create_token(TEST_JWT_SECRET, "anon", now() + 3600);
    let result = decoder().decode(Some(&token));
    assert!(matches!(result, Err(SessionError::InvalidToken(_))));
}

#[test]
fn test_garbage_token_is_an_error() {
    let result = decoder().decode(Some("not-a-jwt"));
    assert!(matches!(result, Err(SessionError::InvalidToken(_))));
}

// --- AccessToken Extractor ---

#[tokio::test]
async fn test_bearer_header_extracted() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_static("Bearer abc.def.ghi"),
    );

    let token = AccessToken::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(token.as_deref(), Some("abc.def.ghi"));
}

#[tokio::test]
async fn test_bearer_header_wins_over_cookie() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_static("Bearer from-header"),
    );
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_static("sb-access-token=from-cookie"),
    );

    let token = AccessToken::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(token.as_deref(), Some("from-header"));
}

#[tokio::test]
async fn test_cookie_extracted() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_static("a=1; sb-access-token=from-cookie; b=2"),
    );

    let token = AccessToken::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(token.as_deref(), Some("from-cookie"));
}

#[tokio::test]
async fn test_non_bearer_scheme_ignored() {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_static("Basic dXNlcjpwYXNz"),
    );

    let token = AccessToken::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(token, AccessToken(None));
}
