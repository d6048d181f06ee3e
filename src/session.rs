use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    auth::SessionDecoder,
    error::SessionError,
    models::{Role, Session, SessionUser, UserRoleRow},
};

/// SessionProvider
///
/// The external authentication/session service as seen by the navigation guard.
/// Both calls are asynchronous and fallible; the guard treats any `Err` as a reason
/// to send the user back to the login page.
///
/// **Send + Sync + async_trait** make `Arc<dyn SessionProvider>` shareable across
/// Axum's request tasks.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session for the presented access token, if one exists.
    async fn get_session(&self, access_token: Option<&str>) -> Result<Option<Session>, SessionError>;

    /// The role assigned to a user, if any. Looked up fresh on every call.
    async fn get_role(&self, user_id: Uuid) -> Result<Option<Role>, SessionError>;
}

/// SessionState
///
/// The concrete type used to share the Session Provider across the application state.
pub type SessionState = Arc<dyn SessionProvider>;

// --- Supabase (REST) ---

/// SupabaseSessionProvider
///
/// Sessions come from Supabase-issued access tokens; roles come from the project's
/// REST API (`users` joined to `roles`).
#[derive(Clone)]
pub struct SupabaseSessionProvider {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
    decoder: SessionDecoder,
}

impl SupabaseSessionProvider {
    pub fn new(
        supabase_url: &str,
        api_key: &str,
        decoder: SessionDecoder,
        timeout: Duration,
    ) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", supabase_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            decoder,
        })
    }
}

#[async_trait]
impl SessionProvider for SupabaseSessionProvider {
    async fn get_session(&self, access_token: Option<&str>) -> Result<Option<Session>, SessionError> {
        self.decoder.decode(access_token)
    }

    /// get_role
    ///
    /// `GET /rest/v1/users?select=roles(name)&id=eq.{id}`. Zero rows, or a user with
    /// no role attached, yields `None`.
    async fn get_role(&self, user_id: Uuid) -> Result<Option<Role>, SessionError> {
        let id_filter = format!("eq.{}", user_id);
        let rows: Vec<UserRoleRow> = self
            .http
            .get(format!("{}/users", self.rest_url))
            .query(&[("select", "roles(name)"), ("id", id_filter.as_str())])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if rows.len() > 1 {
            return Err(SessionError::MalformedResponse(format!(
                "expected at most one users row for {}, got {}",
                user_id,
                rows.len()
            )));
        }

        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.roles)
            .and_then(|role| role.name)
            .map(Role::from))
    }
}

// --- Postgres (direct) ---

/// PostgresSessionProvider
///
/// Same session handling as `SupabaseSessionProvider`, but reads roles straight from
/// the project's Postgres database.
pub struct PostgresSessionProvider {
    pool: PgPool,
    decoder: SessionDecoder,
}

impl PostgresSessionProvider {
    pub fn new(pool: PgPool, decoder: SessionDecoder) -> Self {
        Self { pool, decoder }
    }
}

#[async_trait]
impl SessionProvider for PostgresSessionProvider {
    async fn get_session(&self, access_token: Option<&str>) -> Result<Option<Session>, SessionError> {
        self.decoder.decode(access_token)
    }

    async fn get_role(&self, user_id: Uuid) -> Result<Option<Role>, SessionError> {
        let name: Option<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM users u
            LEFT JOIN roles r ON r.id = u.role_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(name.flatten().map(Role::from))
    }
}

// --- Mock (tests and local development) ---

/// MockSessionProvider
///
/// In-memory provider used by the test-suite. Tokens map to sessions and user ids map
/// to roles; either call can be made to fail, and role lookups are counted so tests
/// can prove the guard never caches them.
#[derive(Default)]
pub struct MockSessionProvider {
    sessions: HashMap<String, Session>,
    roles: HashMap<Uuid, Role>,
    /// When true, `get_session` returns a simulated failure.
    pub fail_session: bool,
    /// When true, `get_role` returns a simulated failure.
    pub fail_role: bool,
    role_lookups: AtomicUsize,
}

impl MockSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            fail_session: true,
            ..Self::default()
        }
    }

    /// Registers `token` as a live session for `user_id`.
    pub fn with_session(mut self, token: &str, user_id: Uuid) -> Self {
        let session = Session {
            user: SessionUser {
                id: user_id,
                email: None,
            },
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        };
        self.sessions.insert(token.to_string(), session);
        self
    }

    pub fn with_role(mut self, user_id: Uuid, role: impl Into<Role>) -> Self {
        self.roles.insert(user_id, role.into());
        self
    }

    /// Shorthand for a session plus its role.
    pub fn with_user(self, token: &str, user_id: Uuid, role: impl Into<Role>) -> Self {
        self.with_session(token, user_id).with_role(user_id, role)
    }

    pub fn role_lookups(&self) -> usize {
        self.role_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn get_session(&self, access_token: Option<&str>) -> Result<Option<Session>, SessionError> {
        if self.fail_session {
            return Err(SessionError::Unavailable(
                "Mock Session Error: Simulation requested".to_string(),
            ));
        }
        Ok(access_token.and_then(|token| self.sessions.get(token).cloned()))
    }

    async fn get_role(&self, user_id: Uuid) -> Result<Option<Role>, SessionError> {
        self.role_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_role {
            return Err(SessionError::Unavailable(
                "Mock Role Error: Simulation requested".to_string(),
            ));
        }
        Ok(self.roles.get(&user_id).cloned())
    }
}
