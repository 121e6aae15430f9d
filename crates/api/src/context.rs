use taxibe_auth::{PrincipalId, Role};
use taxibe_core::CooperativeId;

/// Cooperative context for a request, taken from the bearer token.
///
/// Immutable; present on every authenticated route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CooperativeContext {
    cooperative_id: CooperativeId,
}

impl CooperativeContext {
    pub fn new(cooperative_id: CooperativeId) -> Self {
        Self { cooperative_id }
    }

    pub fn cooperative_id(&self) -> CooperativeId {
        self.cooperative_id
    }
}

/// Principal context for a request (authenticated identity + roles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self { principal_id, roles }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
