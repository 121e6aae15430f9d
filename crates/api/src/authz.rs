//! API-side authorization guard.
//!
//! Checked in each handler before any store access; domain crates and infra
//! stay auth-agnostic.

use taxibe_auth::{AuthzError, CooperativeMembership, Permission, Principal, authorize, permissions_for_roles};

use crate::context::{CooperativeContext, PrincipalContext};

/// Check that the request's principal holds `required` in its cooperative.
pub fn authorize_request(
    cooperative: &CooperativeContext,
    principal: &PrincipalContext,
    required: &Permission,
) -> Result<(), AuthzError> {
    let membership = CooperativeMembership {
        cooperative_id: cooperative.cooperative_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_for_roles(principal.roles()),
    };

    let principal = Principal {
        principal_id: principal.principal_id(),
        active_cooperative_id: cooperative.cooperative_id(),
        membership,
    };

    authorize(&principal, required)
}
