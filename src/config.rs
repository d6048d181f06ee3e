use std::{env, time::Duration};

/// AppConfig
///
/// Holds the console's entire configuration state. Loaded once at startup and never
/// mutated afterwards; handlers and the navigation guard pull it from the shared
/// `AppState` via FromRef.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which secrets are mandatory.
    pub env: Env,
    // Supabase project URL, e.g. https://xyz.supabase.co. The REST API lives under /rest/v1.
    pub supabase_url: String,
    // API key sent as `apikey` and bearer token on role lookups (anon or service key).
    pub supabase_key: String,
    // Secret used to verify Supabase-issued access tokens (HS256).
    pub jwt_secret: String,
    // Expected `aud` claim of Supabase access tokens.
    pub jwt_audience: String,
    // Optional direct Postgres connection. When set, roles are read from the database
    // instead of the REST API.
    pub db_url: Option<String>,
    // Base path the console is mounted under (the browser app's BASE_URL).
    pub base_path: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Upper bound on a single Session Provider call made by the guard.
    pub provider_timeout: Duration,
}

/// Env
///
/// Defines the runtime context: pretty logs and local fallbacks vs JSON logs and
/// mandatory secrets.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

impl Default for AppConfig {
    /// Safe, non-panicking configuration used for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            supabase_url: "http://localhost:54321".to_string(),
            supabase_key: "local-anon-key".to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_audience: "authenticated".to_string(),
            db_url: None,
            base_path: "/".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables and fails fast.
    ///
    /// # Panics
    /// Panics in production when `SUPABASE_URL`, `SUPABASE_KEY` or `SUPABASE_JWT_SECRET`
    /// is missing, so the console never starts with a guard that cannot verify sessions.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let defaults = Self::default();

        let (supabase_url, supabase_key, jwt_secret) = match env {
            Env::Production => (
                env::var("SUPABASE_URL").expect("FATAL: SUPABASE_URL required in prod"),
                env::var("SUPABASE_KEY").expect("FATAL: SUPABASE_KEY required in prod"),
                env::var("SUPABASE_JWT_SECRET")
                    .expect("FATAL: SUPABASE_JWT_SECRET must be set in production."),
            ),
            Env::Local => (
                env::var("SUPABASE_URL").unwrap_or(defaults.supabase_url),
                env::var("SUPABASE_KEY").unwrap_or(defaults.supabase_key),
                env::var("SUPABASE_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            ),
        };

        let provider_timeout = env::var("SESSION_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.provider_timeout);

        Self {
            env,
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_key,
            jwt_secret,
            jwt_audience: env::var("SUPABASE_JWT_AUDIENCE").unwrap_or(defaults.jwt_audience),
            db_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            base_path: normalize_base_path(
                &env::var("BASE_URL").unwrap_or(defaults.base_path),
            ),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            provider_timeout,
        }
    }
}

/// Turns `console`, `/console/` or an empty value into `/console` or `/`.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}
