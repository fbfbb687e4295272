//! Authentication and Authorization Module
//!
//! - `authenticator`: credential check and bearer-token sessions
//! - `permissions`: the role -> resource -> operation table
//! - `password` and `token`: the primitives both rely on

pub mod authenticator;
pub mod password;
pub mod permissions;
pub mod token;

pub use authenticator::{Authenticator, SessionAuthenticator, INVALID_CREDENTIALS};
pub use password::{hash_password, verify_password};
pub use permissions::{resources, Authorizer, Operation};
pub use token::{generate_token, TOKEN_BYTES};
