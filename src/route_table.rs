//! The console's static route table.
//!
//! Routes are declared once at startup, optionally grouped under layouts, and
//! flattened into an ordered, immutable list of `RouteDescriptor`s.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::RouteTableError;
use crate::models::{Role, RouteDescriptor};

/// Route names the console refers to when redirecting.
pub const LOGIN_ROUTE: &str = "Login";
pub const MANAGER_LANDING_ROUTE: &str = "Todo";

/// A layout grouping child routes, mirroring nested browser-router records.
#[derive(Debug, Clone)]
pub struct Layout {
    pub name: String,
    pub path: String,
    pub requires_auth: bool,
    pub roles: Vec<Role>,
}

impl Layout {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            requires_auth: false,
            roles: Vec::new(),
        }
    }

    pub fn requires_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Roles handed down to children that declare none of their own.
    pub fn roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    // Index of the login route; build() guarantees it exists.
    login_index: usize,
    home: String,
    base_path: String,
}

/// Shared handle used by the guard and the router.
pub type RouteTableState = Arc<RouteTable>;

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Finds the route for a requested path. Matching ignores ASCII case and a
    /// trailing slash.
    pub fn resolve(&self, path: &str) -> Option<&RouteDescriptor> {
        let wanted = normalize_path(path);
        self.routes
            .iter()
            .find(|route| route.path.eq_ignore_ascii_case(&wanted))
    }

    pub fn by_name(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|route| route.name == name)
    }

    pub fn login(&self) -> &RouteDescriptor {
        &self.routes[self.login_index]
    }

    pub fn is_login(&self, route: &RouteDescriptor) -> bool {
        route.name == self.login().name
    }

    pub fn home_path(&self) -> &str {
        &self.home
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Path of a named route, falling back to home when the name is unknown.
    pub fn path_of(&self, name: &str) -> &str {
        self.by_name(name)
            .map(|route| route.path.as_str())
            .unwrap_or(&self.home)
    }

    /// Prefixes a table path with the base path the console is mounted under.
    pub fn href(&self, path: &str) -> String {
        match (self.base_path.as_str(), path) {
            ("/", p) => p.to_string(),
            (base, "/") => base.to_string(),
            (base, p) => format!("{}{}", base, p),
        }
    }

    /// Strips the base path from an absolute browser path. Paths outside the base
    /// are returned unchanged.
    pub fn strip_base<'a>(&self, path: &'a str) -> &'a str {
        if self.base_path == "/" {
            return path;
        }
        match path.strip_prefix(self.base_path.as_str()) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') => rest,
            _ => path,
        }
    }
}

#[derive(Debug)]
pub struct RouteTableBuilder {
    routes: Vec<RouteDescriptor>,
    login: String,
    home: String,
    base_path: String,
    errors: Vec<RouteTableError>,
}

impl Default for RouteTableBuilder {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            login: LOGIN_ROUTE.to_string(),
            home: "/".to_string(),
            base_path: "/".to_string(),
            errors: Vec::new(),
        }
    }
}

impl RouteTableBuilder {
    pub fn route(mut self, route: RouteDescriptor) -> Self {
        if !route.path.starts_with('/') {
            self.errors.push(RouteTableError::RelativePath(route.path.clone()));
        }
        self.routes.push(route);
        self
    }

    /// Flattens a layout's children into the table. Children inherit the layout's
    /// auth requirement and, when they declare none, its roles.
    pub fn nest(mut self, layout: Layout, children: Vec<RouteDescriptor>) -> Self {
        for mut child in children {
            child.path = join_paths(&layout.path, &child.path);
            child.requires_auth |= layout.requires_auth;
            if child.roles.is_empty() {
                child.roles = layout.roles.clone();
            }
            self.routes.push(child);
        }
        self
    }

    pub fn login(mut self, name: impl Into<String>) -> Self {
        self.login = name.into();
        self
    }

    pub fn home(mut self, path: impl Into<String>) -> Self {
        self.home = path.into();
        self
    }

    pub fn base_path(mut self, base: impl Into<String>) -> Self {
        self.base_path = base.into();
        self
    }

    pub fn build(mut self) -> Result<RouteTable, RouteTableError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        let mut names = HashSet::new();
        let mut paths = HashSet::new();
        for route in &mut self.routes {
            route.path = normalize_path(&route.path);
            if !names.insert(route.name.clone()) {
                return Err(RouteTableError::DuplicateName(route.name.clone()));
            }
            if !paths.insert(route.path.to_ascii_lowercase()) {
                return Err(RouteTableError::DuplicatePath(route.path.clone()));
            }
            if !route.roles.is_empty() && !route.requires_auth {
                return Err(RouteTableError::RolesWithoutAuth(route.name.clone()));
            }
        }

        let login_index = self
            .routes
            .iter()
            .position(|route| route.name == self.login)
            .ok_or(RouteTableError::MissingLogin(self.login))?;

        Ok(RouteTable {
            routes: self.routes,
            login_index,
            home: normalize_path(&self.home),
            base_path: crate::config::normalize_base_path(&self.base_path),
        })
    }
}

/// console_routes
///
/// The admin console's route table: a public login page and the role-gated views
/// nested under the authenticated home layout.
pub fn console_routes(base_path: &str) -> Result<RouteTable, RouteTableError> {
    RouteTable::builder()
        .base_path(base_path)
        .route(RouteDescriptor::new("/login", LOGIN_ROUTE))
        .nest(
            Layout::new("/", "Home").requires_auth(),
            vec![
                RouteDescriptor::new("/", "Dashboard").requires_auth().roles([Role::Admin]),
                RouteDescriptor::new("users", "Users").requires_auth().roles([Role::Admin]),
                RouteDescriptor::new("reservations", "Reservations")
                    .requires_auth()
                    .roles([Role::Admin]),
                RouteDescriptor::new("vehicles", "Vehicles").requires_auth().roles([Role::Admin]),
                RouteDescriptor::new("approvals", "Approvals")
                    .requires_auth()
                    .roles([Role::Manager]),
                RouteDescriptor::new("schedule", "Schedule").requires_auth().roles([Role::Admin]),
                RouteDescriptor::new("contact", "Contact").requires_auth().roles([Role::Admin]),
                RouteDescriptor::new("todo", MANAGER_LANDING_ROUTE)
                    .requires_auth()
                    .roles([Role::Manager]),
            ],
        )
        .login(LOGIN_ROUTE)
        .home("/")
        .build()
}

fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return child.to_string();
    }
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
