use crate::{
    auth::AccessToken,
    guard::NavigationGuard,
    models::{NavigationDecision, NavigationResponse, RouteDescriptor, ViewResponse},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

// --- Query Structs ---

/// NavigationQuery
///
/// Query parameters of `GET /api/navigation`.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NavigationQuery {
    /// Browser path the user is navigating to, base path included. Query string and
    /// fragment are ignored.
    pub to: String,
}

// --- Handlers ---

/// resolve_navigation
///
/// [Public Route] Runs the navigation guard for `to` on behalf of the caller's session
/// and reports whether the browser router should commit or redirect.
#[utoipa::path(
    get,
    path = "/api/navigation",
    params(NavigationQuery),
    responses(
        (status = 200, description = "Navigation decision", body = NavigationResponse),
        (status = 404, description = "No console route matches `to`")
    )
)]
pub async fn resolve_navigation(
    State(guard): State<NavigationGuard>,
    token: AccessToken,
    Query(query): Query<NavigationQuery>,
) -> Result<Json<NavigationResponse>, StatusCode> {
    let routes = guard.routes();
    let path = query
        .to
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let path = routes.strip_base(path);

    let decision = guard
        .evaluate_path(path, token.as_deref())
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let response = match decision {
        NavigationDecision::Allow => NavigationResponse {
            to: query.to,
            outcome: "allow".to_string(),
            redirect_to: None,
        },
        NavigationDecision::RedirectTo(target) => NavigationResponse {
            to: query.to,
            outcome: "redirect".to_string(),
            redirect_to: Some(routes.href(&target)),
        },
    };

    Ok(Json(response))
}

/// list_routes
///
/// [Public Route] Returns the console's route table so the browser app declares its
/// router from the same source.
#[utoipa::path(
    get,
    path = "/api/routes",
    responses((status = 200, description = "Route table", body = [RouteDescriptor]))
)]
pub async fn list_routes(State(guard): State<NavigationGuard>) -> Json<Vec<RouteDescriptor>> {
    Json(guard.routes().routes().to_vec())
}

/// render_view
///
/// [Guarded Route] Reached only after the navigation guard committed the navigation.
/// The guard middleware attaches the resolved route descriptor.
pub async fn render_view(Extension(route): Extension<RouteDescriptor>) -> Json<ViewResponse> {
    Json(ViewResponse::from(&route))
}
