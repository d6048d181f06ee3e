use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod route_table;
pub mod session;

// HTTP surface split by access policy (public vs guarded views).
pub mod routes;
use routes::{guarded, public};

// --- Public Re-exports ---

pub use auth::{AccessToken, SessionDecoder};
pub use config::AppConfig;
pub use guard::NavigationGuard;
pub use models::{NavigationDecision, RouteDescriptor};
pub use route_table::{RouteTable, console_routes};
pub use session::{MockSessionProvider, SessionProvider, SessionState};

/// ApiDoc
///
/// OpenAPI document for the console's JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::resolve_navigation, handlers::list_routes),
    components(
        schemas(
            models::NavigationResponse, models::RouteDescriptor, models::ViewResponse,
        )
    ),
    tags(
        (name = "fleet-console", description = "Fleet admin console navigation API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container shared by every request. The navigation guard
/// owns the Session Provider and the route table.
#[derive(Clone)]
pub struct AppState {
    pub guard: NavigationGuard,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for NavigationGuard {
    fn from_ref(app_state: &AppState) -> NavigationGuard {
        app_state.guard.clone()
    }
}

/// navigation_guard_middleware
///
/// Runs the navigation guard in front of every view route, and behind the views
/// router's fallback so that paths differing only in case or a trailing slash reach
/// `RouteTable::resolve` too.
///
/// *Mechanism*: resolves the requested path against the route table, evaluates the
/// guard, and either commits (the descriptor is attached to the request for the view
/// handler) or answers with a `307` to the base-prefixed redirect target. See
/// `commits_instead` for the redirects that commit.
async fn navigation_guard_middleware(
    State(guard): State<NavigationGuard>,
    token: AccessToken,
    mut request: Request,
    next: Next,
) -> Response {
    let routes = guard.routes();
    let Some(route) = routes.resolve(request.uri().path()).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let NavigationDecision::RedirectTo(target) = guard.evaluate(&route, token.as_deref()).await {
        if !commits_instead(&guard, &route, &target, token.as_deref()).await {
            return Redirect::temporary(&routes.href(&target)).into_response();
        }
    }

    request.extensions_mut().insert(route);
    next.run(request).await
}

/// Whether a redirect from `route` to `target` should commit `route` instead.
///
/// True when `target` is `route` itself (signed out on `/login` is sent to `/login`),
/// or when `route` is the login page and `target` would send the user straight back
/// to it (a signed-in role with no landing view of its own). Only the login page is
/// committed this way, so a denied view is never entered.
async fn commits_instead(
    guard: &NavigationGuard,
    route: &RouteDescriptor,
    target: &str,
    token: Option<&str>,
) -> bool {
    let routes = guard.routes();
    let Some(next_route) = routes.resolve(target) else {
        return false;
    };
    if next_route.name == route.name {
        return true;
    }
    if !routes.is_login(route) {
        return false;
    }

    match guard.evaluate(next_route, token).await {
        NavigationDecision::RedirectTo(back) => routes
            .resolve(&back)
            .is_some_and(|back_route| back_route.name == route.name),
        NavigationDecision::Allow => false,
    }
}

/// create_router
///
/// Assembles the console's routing structure, applies the guard and the observability
/// layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // Every view route, and the views fallback, sits behind the navigation guard.
    let views = guarded::view_routes(state.guard.routes()).layer(
        middleware::from_fn_with_state(state.clone(), navigation_guard_middleware),
    );

    let base_path = state.guard.routes().base_path().to_string();
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes());

    // Mounted under BASE_URL; nesting strips the prefix so the guard sees table paths.
    let base_router = if base_path == "/" {
        base_router.merge(views)
    } else {
        base_router.nest(&base_path, views)
    };

    base_router
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span, carrying the `x-request-id` so every log line of a
/// navigation (including the guard's) is correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
