//! `shopfront-auth`: identity and authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows who an
//! actor is and what that actor may do, never how records are persisted.

pub mod actor;
pub mod authorize;
pub mod claims;
pub mod groups;
pub mod password;
pub mod permissions;
pub mod policy;
pub mod user;

pub use actor::Actor;
pub use authorize::{authorize, AuthzError};
pub use claims::{validate_claims, Hs256Jwt, SessionClaims, TokenValidationError};
pub use groups::Group;
pub use password::{PasswordHash, PasswordHashError};
pub use permissions::Permission;
pub use policy::{BlogTarget, Decision, Denial, ProductTarget};
pub use user::{normalize_email, ProfileUpdate, Registration, User};
