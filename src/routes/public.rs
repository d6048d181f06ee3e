use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that need no session. `/api/navigation` evaluates the guard for whoever
/// calls it, so it is itself public: the decision, not the endpoint, is gated.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /api/routes
        // The static route table the browser router is declared from.
        .route("/api/routes", get(handlers::list_routes))
        // GET /api/navigation?to=/users
        // Guard decision for a pending browser navigation.
        .route("/api/navigation", get(handlers::resolve_navigation))
}
