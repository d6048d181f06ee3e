use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Identity ---

/// Role
///
/// The single role label attached to a console user. Labels are matched exactly
/// (case-sensitive); anything other than the two known labels is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Manager,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Other(label) => label,
        }
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Admin" => Role::Admin,
            "Manager" => Role::Manager,
            _ => Role::Other(label),
        }
    }
}

impl From<&str> for Role {
    fn from(label: &str) -> Self {
        Role::from(label.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SessionUser
///
/// The user identity carried by a session. `id` keys the role lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Session
///
/// An authenticated session as handed out by the Session Provider. The guard only
/// reads it; creation and destruction belong to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
}

/// UserRoleRow
///
/// One row of `users?select=roles(name)` from the Supabase REST API. The `roles`
/// embed is null when the user has no role assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRoleRow {
    pub roles: Option<RoleRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRef {
    pub name: Option<String>,
}

// --- Routing ---

/// RouteDescriptor
///
/// Static declaration of one navigable console view. Built once at startup and
/// immutable afterwards. An empty `roles` list means any authenticated session
/// (or anyone, when `requires_auth` is unset) may enter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteDescriptor {
    pub name: String,
    pub path: String,
    pub requires_auth: bool,
    #[ts(type = "Array<string>")]
    #[schema(value_type = Vec<String>)]
    pub roles: Vec<Role>,
}

impl RouteDescriptor {
    /// A route anyone may enter.
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

    pub fn roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// True when no roles are declared or `role` is one of them.
    pub fn permits(&self, role: &Role) -> bool {
        self.roles.is_empty() || self.roles.contains(role)
    }
}

/// NavigationDecision
///
/// Outcome of one guard evaluation. `RedirectTo` carries a route table path; the
/// HTTP layer prefixes the base path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum NavigationDecision {
    Allow,
    RedirectTo(String),
}

// --- Response Payloads ---

/// NavigationResponse
///
/// Body of `GET /api/navigation`. The browser router commits or redirects on it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigationResponse {
    /// The requested path, as received.
    pub to: String,
    /// Either "allow" or "redirect".
    #[schema(example = "redirect")]
    pub outcome: String,
    /// Absolute (base-prefixed) redirect target when `outcome` is "redirect".
    #[schema(example = "/login")]
    pub redirect_to: Option<String>,
}

/// ViewResponse
///
/// Body returned once a navigation to a console view commits.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ViewResponse {
    pub name: String,
    pub path: String,
    pub requires_auth: bool,
    pub roles: Vec<String>,
}

impl From<&RouteDescriptor> for ViewResponse {
    fn from(route: &RouteDescriptor) -> Self {
        Self {
            name: route.name.clone(),
            path: route.path.clone(),
            requires_auth: route.requires_auth,
            roles: route.roles.iter().map(|role| role.to_string()).collect(),
        }
    }
}
