use crate::{AppState, handlers, route_table::RouteTable};
use axum::{Router, routing::get};

/// Guarded Router Module
///
/// Registers a `GET` for every route in the table, plus a fallback for paths that
/// only match the table loosely (`/Users`, `/users/`). The navigation guard is layered
/// on top by `create_router`; it resolves the descriptor, decides, and hands the
/// descriptor to `render_view` through a request extension. Paths the table does not
/// know are answered with a 404 by the guard before the fallback runs.
pub fn view_routes(routes: &RouteTable) -> Router<AppState> {
    routes
        .routes()
        .iter()
        .fold(Router::new(), |router, route| {
            router.route(&route.path, get(handlers::render_view))
        })
        .fallback(handlers::render_view)
}
