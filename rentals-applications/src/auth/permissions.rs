//! Role-based access control
//!
//! A role is granted operations per resource. Nothing is implied: a triple
//! that was never granted is denied, and admin gets its access from policy
//! entries like every other role.

use rentals_core::{ErrorContext, RentalsError, Role};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Resource names used as the second key of the permission table
pub mod resources {
    pub const ACCOUNTS: &str = "accounts";
    pub const LISTINGS: &str = "listings";
}

/// Operations subject to authorization
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ];

    /// Map an HTTP verb to the operation it performs.
    /// Verbs outside the table have no operation and are never allowed.
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "POST" => Some(Operation::Create),
            "GET" | "HEAD" => Some(Operation::Read),
            "PATCH" | "PUT" => Some(Operation::Update),
            "DELETE" => Some(Operation::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

impl std::str::FromStr for Operation {
    type Err = RentalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Operation::Create),
            "read" => Ok(Operation::Read),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            _ => Err(RentalsError::Validation {
                message: format!("Unknown operation: {}", s),
                field: Some("operation".to_string()),
                context: ErrorContext::new("permissions")
                    .with_suggestion("Use one of: create, read, update, delete"),
            }),
        }
    }
}

/// Permission table: role -> resource -> operations.
///
/// Built once before serving and shared read-only afterwards, so lookups
/// need no locking.
#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    perm: HashMap<String, HashMap<String, HashSet<Operation>>>,
}

impl Authorizer {
    /// An empty table that denies everything
    pub fn new() -> Self {
        Self::default()
    }

    /// The policy the service ships with
    pub fn with_default_policy() -> Self {
        let mut authorizer = Self::new();
        authorizer.add_permission(Role::Admin.as_str(), resources::ACCOUNTS, Operation::ALL);
        authorizer.add_permission(Role::Admin.as_str(), resources::LISTINGS, Operation::ALL);
        authorizer.add_permission(Role::Realtor.as_str(), resources::LISTINGS, Operation::ALL);
        authorizer.add_permission(Role::Client.as_str(), resources::LISTINGS, [Operation::Read]);
        authorizer
    }

    /// Grant each operation to `role` on `resource`. Granting twice is a no-op.
    pub fn add_permission(
        &mut self,
        role: &str,
        resource: &str,
        operations: impl IntoIterator<Item = Operation>,
    ) {
        self.perm
            .entry(role.to_string())
            .or_default()
            .entry(resource.to_string())
            .or_default()
            .extend(operations);
    }

    pub fn allowed(&self, role: &str, resource: &str, operation: Operation) -> bool {
        self.perm
            .get(role)
            .and_then(|resources| resources.get(resource))
            .is_some_and(|operations| operations.contains(&operation))
    }

    /// Sorted view of the table, for display
    pub fn grants(&self) -> BTreeMap<(String, String), Vec<Operation>> {
        let mut grants = BTreeMap::new();
        for (role, resources) in &self.perm {
            for (resource, operations) in resources {
                let mut operations: Vec<Operation> = operations.iter().copied().collect();
                operations.sort();
                grants.insert((role.clone(), resource.clone()), operations);
            }
        }
        grants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_table() {
        let authorizer = Authorizer::with_default_policy();

        let expected: [(&str, &str, &[Operation]); 6] = [
            ("admin", resources::ACCOUNTS, &Operation::ALL),
            ("admin", resources::LISTINGS, &Operation::ALL),
            ("realtor", resources::ACCOUNTS, &[]),
            ("realtor", resources::LISTINGS, &Operation::ALL),
            ("client", resources::ACCOUNTS, &[]),
            ("client", resources::LISTINGS, &[Operation::Read]),
        ];

        for (role, resource, granted) in expected {
            for op in Operation::ALL {
                assert_eq!(
                    authorizer.allowed(role, resource, op),
                    granted.contains(&op),
                    "{role} {op} {resource}"
                );
            }
        }
    }

    #[test]
    fn test_only_admin_touches_accounts() {
        let authorizer = Authorizer::with_default_policy();
        for role in Role::ALL {
            for op in Operation::ALL {
                let allowed = authorizer.allowed(role.as_str(), resources::ACCOUNTS, op);
                assert_eq!(allowed, role == Role::Admin);
            }
        }
    }

    #[test]
    fn test_default_deny() {
        let authorizer = Authorizer::with_default_policy();
        assert!(!authorizer.allowed("superuser", resources::LISTINGS, Operation::Read));
        assert!(!authorizer.allowed("admin", "payments", Operation::Read));
        assert!(!authorizer.allowed("", "", Operation::Read));

        let empty = Authorizer::new();
        assert!(!empty.allowed("admin", resources::ACCOUNTS, Operation::Read));
    }

    #[test]
    fn test_add_permission_is_idempotent() {
        let mut once = Authorizer::new();
        once.add_permission("realtor", "listings", [Operation::Create]);

        let mut many = Authorizer::new();
        for _ in 0..5 {
            many.add_permission("realtor", "listings", [Operation::Create, Operation::Create]);
        }

        assert_eq!(once.grants(), many.grants());
        assert!(many.allowed("realtor", "listings", Operation::Create));
        assert!(!many.allowed("realtor", "listings", Operation::Read));
    }

    #[test]
    fn test_grants_accumulate() {
        let mut authorizer = Authorizer::new();
        authorizer.add_permission("client", "listings", [Operation::Read]);
        authorizer.add_permission("client", "listings", [Operation::Update]);

        let grants = authorizer.grants();
        assert_eq!(
            grants.get(&("client".to_string(), "listings".to_string())),
            Some(&vec![Operation::Read, Operation::Update])
        );
    }

    #[test]
    fn test_operation_from_method() {
        assert_eq!(Operation::from_method("POST"), Some(Operation::Create));
        assert_eq!(Operation::from_method("GET"), Some(Operation::Read));
        assert_eq!(Operation::from_method("PATCH"), Some(Operation::Update));
        assert_eq!(Operation::from_method("PUT"), Some(Operation::Update));
        assert_eq!(Operation::from_method("DELETE"), Some(Operation::Delete));
        assert_eq!(Operation::from_method("OPTIONS"), None);
        assert_eq!(Operation::from_method("TRACE"), None);
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!("Read".parse::<Operation>().unwrap(), Operation::Read);
        assert_eq!(Operation::Delete.to_string(), "delete");
        assert!("write".parse::<Operation>().is_err());
    }
}
