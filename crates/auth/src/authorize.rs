use std::collections::HashSet;

use thiserror::Error;

use taxibe_core::CooperativeId;

use crate::{CooperativeMembership, Permission, PrincipalId};

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub active_cooperative_id: CooperativeId,
    pub membership: CooperativeMembership,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("cooperative mismatch")]
    CooperativeMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal within its active cooperative.
///
/// Pure policy check: no IO, no panics.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.active_cooperative_id != principal.membership.cooperative_id {
        return Err(AuthzError::CooperativeMismatch);
    }

    let perms: HashSet<&str> = principal
        .membership
        .permissions
        .iter()
        .map(|p| p.as_str())
        .collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        tracing::debug!(principal = %principal.principal_id, permission = %required, "permission denied");
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Role, permissions_for_roles};

    fn principal(roles: Vec<Role>) -> Principal {
        let coop = CooperativeId::new();
        Principal {
            principal_id: PrincipalId::new(),
            active_cooperative_id: coop,
            membership: CooperativeMembership {
                cooperative_id: coop,
                permissions: permissions_for_roles(&roles),
                roles,
            },
        }
    }

    #[test]
    fn wildcard_allows_anything() {
        let p = principal(vec![Role::new("admin")]);
        assert!(authorize(&p, &Permission::new(Permission::CLOTURES_WRITE)).is_ok());
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let p = principal(vec![Role::new("guichetier")]);
        assert_eq!(
            authorize(&p, &Permission::new(Permission::DEPENSES_WRITE)),
            Err(AuthzError::Forbidden("depenses.write".into()))
        );
    }

    #[test]
    fn membership_for_other_cooperative_is_rejected() {
        let mut p = principal(vec![Role::new("admin")]);
        p.active_cooperative_id = CooperativeId::new();
        assert_eq!(
            authorize(&p, &Permission::new(Permission::CLIENTS_READ)),
            Err(AuthzError::CooperativeMismatch)
        );
    }
}
