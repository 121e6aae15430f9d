//! `taxibe-auth` — authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage: the API layer feeds it bearer tokens and
//! asks it for permission decisions.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{authorize, AuthzError, Principal};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::{Permission, permissions_for_roles};
pub use principal::{CooperativeMembership, PrincipalId};
pub use roles::Role;
