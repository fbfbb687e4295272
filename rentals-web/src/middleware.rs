//! Authentication and authorization gate
//!
//! Runs in front of every matched route. Public routes pass untouched.
//! Everything else needs a token in the `Authorization` header (the whole
//! header value is the token). Resource routes additionally need the
//! caller's role to hold the operation implied by the HTTP verb.

use crate::error::ApiError;
use crate::routes::{RouteAccess, RouteTable};
use axum::{
    extract::{MatchedPath, Request, State},
    http::{header::AUTHORIZATION, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rentals_applications::{Authenticator, Authorizer, Operation};
use rentals_core::{Account, ErrorContext, RentalsError, RentalsResult};
use std::sync::Arc;
use tracing::{debug, warn};

fn unauthorized(reason: &str) -> RentalsError {
    RentalsError::Authentication {
        message: reason.to_string(),
        context: ErrorContext::new("auth_middleware").with_operation("authenticate"),
    }
}

fn forbidden(account: &Account, resource: &str, method: &Method) -> RentalsError {
    RentalsError::Authorization {
        message: format!("{} may not {} {}", account.role, method, resource),
        context: ErrorContext::new("auth_middleware")
            .with_operation("authorize")
            .with_metadata("account_id", &account.id),
    }
}

/// Everything the middleware needs to decide on a request
#[derive(Clone)]
pub struct AuthGate {
    authenticator: Arc<dyn Authenticator>,
    authorizer: Arc<Authorizer>,
    routes: Arc<RouteTable>,
}

impl AuthGate {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        authorizer: Arc<Authorizer>,
        routes: RouteTable,
    ) -> Self {
        Self {
            authenticator,
            authorizer,
            routes: Arc::new(routes),
        }
    }

    /// Decide on a request.
    ///
    /// Returns the caller's account for protected routes and `None` for
    /// public ones. Authentication is always settled before any permission
    /// is looked at, so a bad token is a 401 even where the role would be
    /// denied anyway.
    pub async fn check(
        &self,
        route: Option<&str>,
        method: &Method,
        authorization: Option<&str>,
    ) -> RentalsResult<Option<Account>> {
        // A route missing from the table still needs a token.
        let access = route
            .and_then(|pattern| self.routes.access(pattern))
            .unwrap_or(RouteAccess::Authenticated);

        if access == RouteAccess::Public {
            return Ok(None);
        }

        let token = authorization.ok_or_else(|| unauthorized("missing Authorization header"))?;
        let account = self
            .authenticator
            .verify(token)
            .await?
            .ok_or_else(|| unauthorized("unknown token"))?;

        if let RouteAccess::Resource(resource) = access {
            let allowed = Operation::from_method(method.as_str()).is_some_and(|operation| {
                self.authorizer
                    .allowed(account.role.as_str(), resource, operation)
            });
            if !allowed {
                return Err(forbidden(&account, resource, method));
            }
        }

        debug!(account_id = %account.id, route = ?route, %method, "Request authorized");
        Ok(Some(account))
    }
}

/// Axum middleware wrapping [`AuthGate::check`]. The authenticated account
/// is stored in the request extensions for handlers.
pub async fn auth_middleware(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned());
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match gate
        .check(route.as_deref(), request.method(), authorization.as_deref())
        .await
    {
        Ok(Some(account)) => {
            request.extensions_mut().insert(account);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(e) => {
            if e.is_client_error() {
                warn!(route = ?route, method = %request.method(), "Request rejected: {}", e);
            }
            ApiError::from(e).into_response()
        }
    }
}
