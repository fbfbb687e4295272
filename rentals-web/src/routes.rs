//! Route definitions and the route -> resource table
//!
//! Every route is registered together with its access rule, so the auth
//! middleware can look the rule up by the matched route pattern instead of
//! guessing from the request path.

use crate::handlers::{self, accounts, listings};
use crate::AppState;
use axum::{
    routing::{get, post, MethodRouter},
    Router,
};
use rentals_applications::resources;
use std::collections::HashMap;

/// What a route demands from the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// No token needed
    Public,
    /// Any valid token
    Authenticated,
    /// Valid token plus a permission on the named resource
    Resource(&'static str),
}

/// Access rules keyed by route pattern (e.g. `/listings/{id}`)
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteAccess>,
}

impl RouteTable {
    pub fn insert(&mut self, pattern: &str, access: RouteAccess) {
        self.routes.insert(pattern.to_string(), access);
    }

    /// Exact lookup by route pattern
    pub fn access(&self, pattern: &str) -> Option<RouteAccess> {
        self.routes.get(pattern).copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Router under construction together with its route table
pub struct ApiRouter {
    router: Router<AppState>,
    table: RouteTable,
}

impl ApiRouter {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            table: RouteTable::default(),
        }
    }

    fn add(mut self, path: &str, access: RouteAccess, method_router: MethodRouter<AppState>) -> Self {
        self.table.insert(path, access);
        self.router = self.router.route(path, method_router);
        self
    }

    pub fn public(self, path: &str, method_router: MethodRouter<AppState>) -> Self {
        self.add(path, RouteAccess::Public, method_router)
    }

    pub fn authenticated(self, path: &str, method_router: MethodRouter<AppState>) -> Self {
        self.add(path, RouteAccess::Authenticated, method_router)
    }

    pub fn resource(
        self,
        path: &str,
        resource: &'static str,
        method_router: MethodRouter<AppState>,
    ) -> Self {
        self.add(path, RouteAccess::Resource(resource), method_router)
    }

    pub fn into_parts(self) -> (Router<AppState>, RouteTable) {
        (self.router, self.table)
    }
}

impl Default for ApiRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// All API routes
pub fn api_routes() -> ApiRouter {
    ApiRouter::new()
        .public("/health", get(handlers::health_check))
        .public("/login", post(handlers::login))
        .public("/newClient", post(handlers::new_client))
        .authenticated("/profile", get(handlers::profile))
        .resource(
            "/accounts",
            resources::ACCOUNTS,
            post(accounts::create_account).get(accounts::list_accounts),
        )
        .resource(
            "/accounts/{id}",
            resources::ACCOUNTS,
            get(accounts::get_account)
                .patch(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .resource(
            "/listings",
            resources::LISTINGS,
            post(listings::create_listing).get(listings::find_listings),
        )
        .resource(
            "/listings/{id}",
            resources::LISTINGS,
            get(listings::get_listing)
                .patch(listings::update_listing)
                .delete(listings::delete_listing),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_registered_routes() {
        let (_, table) = api_routes().into_parts();

        assert_eq!(table.len(), 8);
        assert_eq!(table.access("/login"), Some(RouteAccess::Public));
        assert_eq!(table.access("/newClient"), Some(RouteAccess::Public));
        assert_eq!(table.access("/profile"), Some(RouteAccess::Authenticated));
        assert_eq!(
            table.access("/accounts/{id}"),
            Some(RouteAccess::Resource(resources::ACCOUNTS))
        );
        assert_eq!(
            table.access("/listings"),
            Some(RouteAccess::Resource(resources::LISTINGS))
        );
    }

    #[test]
    fn test_lookup_is_exact() {
        let (_, table) = api_routes().into_parts();

        assert_eq!(table.access("/listingsfoo"), None);
        assert_eq!(table.access("/accounts/42"), None);
        assert_eq!(table.access("/login/"), None);
    }
}
