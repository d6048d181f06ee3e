use fleet_console::{
    AppState, NavigationGuard,
    auth::SessionDecoder,
    config::{AppConfig, Env},
    console_routes, create_router,
    session::{PostgresSessionProvider, SessionState, SupabaseSessionProvider},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: loads configuration, sets up logging, picks the Session Provider,
/// builds the route table and guard, and serves the console.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging. RUST_LOG wins over the local-development default.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fleet_console=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Console starting in {:?} mode", config.env);

    // 3. Session Provider. Direct database role lookups when DATABASE_URL is set,
    // the Supabase REST API otherwise.
    let decoder = SessionDecoder::new(&config.jwt_secret, &config.jwt_audience);
    let sessions: SessionState = match &config.db_url {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(config.provider_timeout)
                .connect(db_url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");
            tracing::info!("Resolving roles from Postgres");
            Arc::new(PostgresSessionProvider::new(pool, decoder)) as SessionState
        }
        None => {
            let provider = SupabaseSessionProvider::new(
                &config.supabase_url,
                &config.supabase_key,
                decoder,
                config.provider_timeout,
            )
            .expect("FATAL: Failed to build the Supabase HTTP client.");
            tracing::info!(url = %config.supabase_url, "Resolving roles from Supabase REST");
            Arc::new(provider) as SessionState
        }
    };

    // 4. Route table and guard
    let routes = console_routes(&config.base_path).expect("FATAL: invalid console route table");
    tracing::info!(
        routes = routes.routes().len(),
        base = %routes.base_path(),
        "Route table loaded"
    );
    let guard = NavigationGuard::new(sessions, Arc::new(routes)).with_timeout(config.provider_timeout);

    // 5. Router and server
    let bind_addr = config.bind_addr;
    let app = create_router(AppState { guard });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.expect("server error");
}
