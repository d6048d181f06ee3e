//! The navigation guard: decides, for every route transition, whether to commit it
//! or where to send the user instead.
//!
//! The guard holds no state between evaluations. Session and role are re-read from
//! the Session Provider on every call, so two evaluations with the same inputs always
//! agree.

use std::future::Future;
use std::time::Duration;

use crate::{
    error::SessionError,
    models::{NavigationDecision, Role, RouteDescriptor},
    route_table::{MANAGER_LANDING_ROUTE, RouteTable, RouteTableState},
    session::SessionState,
};

#[derive(Clone)]
pub struct NavigationGuard {
    provider: SessionState,
    routes: RouteTableState,
    timeout: Option<Duration>,
}

impl NavigationGuard {
    pub fn new(provider: SessionState, routes: RouteTableState) -> Self {
        Self {
            provider,
            routes,
            timeout: None,
        }
    }

    /// Bounds every Session Provider call. A call that overruns counts as a failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decides a navigation to `to` for whoever holds `access_token`. Provider failures
    /// never escape: they are logged and turned into a login redirect.
    pub async fn evaluate(&self, to: &RouteDescriptor, access_token: Option<&str>) -> NavigationDecision {
        let decision = match self.decide(to, access_token).await {
            Ok(decision) => decision,
            Err(err) => {
                tracing::error!(route = %to.path, error = %err, "Error checking auth session");
                self.to_login()
            }
        };
        tracing::debug!(route = %to.path, ?decision, "navigation decided");
        decision
    }

    /// Like `evaluate`, for a raw table path. `None` when no route matches.
    pub async fn evaluate_path(&self, path: &str, access_token: Option<&str>) -> Option<NavigationDecision> {
        let route = self.routes.resolve(path)?;
        Some(self.evaluate(route, access_token).await)
    }

    async fn decide(
        &self,
        to: &RouteDescriptor,
        access_token: Option<&str>,
    ) -> Result<NavigationDecision, SessionError> {
        let session = self.call(self.provider.get_session(access_token)).await?;

        let Some(session) = session else {
            return Ok(if to.requires_auth {
                self.to_login()
            } else {
                NavigationDecision::Allow
            });
        };

        tracing::debug!(
            user_id = %session.user.id,
            email = session.user.email.as_deref().unwrap_or("unknown"),
            expires_at = %session.expires_at,
            "session found"
        );

        let Some(role) = self.call(self.provider.get_role(session.user.id)).await? else {
            tracing::warn!(user_id = %session.user.id, "No role assigned to user");
            return Ok(self.to_login());
        };

        if self.routes.is_login(to) {
            return Ok(NavigationDecision::RedirectTo(self.landing_for(&role)));
        }

        if !to.permits(&role) {
            tracing::warn!("Access denied to {} for role {}", to.path, role);
            return Ok(self.denied_redirect(&role));
        }

        Ok(NavigationDecision::Allow)
    }

    async fn call<T, F>(&self, fut: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, SessionError>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| SessionError::Timeout(limit))?,
            None => fut.await,
        }
    }

    /// Where a signed-in user lands when they open the login page.
    fn landing_for(&self, role: &Role) -> String {
        match role {
            Role::Manager => self.routes.path_of(MANAGER_LANDING_ROUTE).to_string(),
            _ => self.routes.home_path().to_string(),
        }
    }

    /// Where a signed-in user goes when their role may not enter a route.
    fn denied_redirect(&self, role: &Role) -> NavigationDecision {
        match role {
            Role::Manager | Role::Admin => NavigationDecision::RedirectTo(self.landing_for(role)),
            Role::Other(_) => self.to_login(),
        }
    }

    fn to_login(&self) -> NavigationDecision {
        NavigationDecision::RedirectTo(self.routes.login().path.clone())
    }
}
