use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use fleet_console::{
    AppState, MockSessionProvider, NavigationGuard, console_routes, create_router,
    models::{NavigationResponse, Role, RouteDescriptor, ViewResponse},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

// --- Setup ---

fn provider() -> MockSessionProvider {
    MockSessionProvider::new()
        .with_user("admin-token", Uuid::from_u128(1), Role::Admin)
        .with_user("manager-token", Uuid::from_u128(2), Role::Manager)
        .with_user("driver-token", Uuid::from_u128(3), "Driver")
}

fn app_with(provider: MockSessionProvider, base_path: &str) -> Router {
    let routes = console_routes(base_path).unwrap();
    let guard = NavigationGuard::new(Arc::new(provider), Arc::new(routes));

    create_router(AppState { guard })
}

fn app() -> Router {
    app_with(provider(), "/")
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn json_body<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// --- Public routes ---

#[tokio::test]
async fn test_health_check() {
    let response = app().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_route_table_is_published() {
    let response = app().oneshot(get("/api/routes", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let routes: Vec<RouteDescriptor> = json_body(response).await;
    assert_eq!(routes.len(), 9);
    assert_eq!(routes[0].name, "Login");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = app().oneshot(get("/health", None)).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

// --- Guarded views ---

#[tokio::test]
async fn test_signed_out_view_redirects_to_login() {
    let response = app().oneshot(get("/users", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_signed_out_login_page_commits() {
    let response = app().oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view: ViewResponse = json_body(response).await;
    assert_eq!(view.name, "Login");
}

#[tokio::test]
async fn test_admin_view_commits_for_admin() {
    let response = app().oneshot(get("/users", Some("admin-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view: ViewResponse = json_body(response).await;
    assert_eq!(view.name, "Users");
    assert_eq!(view.roles, vec!["Admin".to_string()]);
}

#[tokio::test]
async fn test_manager_on_login_redirects_to_todo() {
    let response = app().oneshot(get("/login", Some("manager-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/todo");
}

#[tokio::test]
async fn test_admin_on_manager_view_redirects_home() {
    let response = app().oneshot(get("/approvals", Some("admin-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_view_path_matching_ignores_case() {
    let response = app().oneshot(get("/Users", Some("admin-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view: ViewResponse = json_body(response).await;
    assert_eq!(view.name, "Users");
    assert_eq!(view.path, "/users");
}

#[tokio::test]
async fn test_view_path_matching_ignores_trailing_slash() {
    let response = app().oneshot(get("/users/", Some("admin-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view: ViewResponse = json_body(response).await;
    assert_eq!(view.name, "Users");
}

#[tokio::test]
async fn test_loose_path_still_guarded() {
    let response = app().oneshot(get("/USERS/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_unknown_view_is_not_found() {
    let response = app().oneshot(get("/nowhere", Some("admin-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_loose_path_under_base_path() {
    let response = app_with(provider(), "/console")
        .oneshot(get("/console/Todo/", Some("manager-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let view: ViewResponse = json_body(response).await;
    assert_eq!(view.name, "Todo");
}

#[tokio::test]
async fn test_role_without_landing_view_settles_on_login() {
    let app = app();

    // Home denies the role and sends it to login; login must commit, not bounce back.
    let response = app.clone().oneshot(get("/", Some("driver-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");

    let response = app.oneshot(get("/login", Some("driver-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view: ViewResponse = json_body(response).await;
    assert_eq!(view.name, "Login");
}

#[tokio::test]
async fn test_token_read_from_cookie() {
    let request = Request::builder()
        .uri("/todo")
        .header(header::COOKIE, "theme=dark; sb-access-token=manager-token")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_provider_failure_redirects_to_login() {
    let app = app_with(MockSessionProvider::new_failing(), "/");

    let response = app.clone().oneshot(get("/users", Some("admin-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");

    // The login page itself still commits, so the user is not stuck in a loop.
    let response = app.oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_views_mounted_under_base_path() {
    let app = app_with(provider(), "/console");

    let response = app.clone().oneshot(get("/console/users", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/console/login");

    let response = app.clone().oneshot(get("/console", Some("admin-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view: ViewResponse = json_body(response).await;
    assert_eq!(view.name, "Dashboard");

    let response = app.oneshot(get("/users", Some("admin-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// --- Navigation API ---

#[tokio::test]
async fn test_navigation_api_allow() {
    let response = app()
        .oneshot(get("/api/navigation?to=/todo", Some("manager-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: NavigationResponse = json_body(response).await;
    assert_eq!(body.to, "/todo");
    assert_eq!(body.outcome, "allow");
    assert_eq!(body.redirect_to, None);
}

#[tokio::test]
async fn test_navigation_api_redirect_ignores_query_string() {
    let response = app()
        .oneshot(get("/api/navigation?to=/users%3Fpage%3D2", Some("manager-token")))
        .await
        .unwrap();

    let body: NavigationResponse = json_body(response).await;
    assert_eq!(body.outcome, "redirect");
    assert_eq!(body.redirect_to.as_deref(), Some("/todo"));
}

#[tokio::test]
async fn test_navigation_api_under_base_path() {
    let response = app_with(provider(), "/console")
        .oneshot(get("/api/navigation?to=/console/approvals", None))
        .await
        .unwrap();

    let body: NavigationResponse = json_body(response).await;
    assert_eq!(body.outcome, "redirect");
    assert_eq!(body.redirect_to.as_deref(), Some("/console/login"));
}

#[tokio::test]
async fn test_navigation_api_unknown_path() {
    let response = app()
        .oneshot(get("/api/navigation?to=/nowhere", Some("admin-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
