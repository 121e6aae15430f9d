use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. `"places.write"`). The wildcard `"*"`
/// grants everything within the cooperative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const CONFIGURATION_READ: &'static str = "configuration.read";
    pub const CONFIGURATION_WRITE: &'static str = "configuration.write";
    pub const CLIENTS_READ: &'static str = "clients.read";
    pub const CLIENTS_WRITE: &'static str = "clients.write";
    pub const VOITURES_READ: &'static str = "voitures.read";
    pub const VOITURES_WRITE: &'static str = "voitures.write";
    pub const PLACES_READ: &'static str = "places.read";
    pub const PLACES_WRITE: &'static str = "places.write";
    pub const DEPENSES_READ: &'static str = "depenses.read";
    pub const DEPENSES_WRITE: &'static str = "depenses.write";
    pub const CLOTURES_READ: &'static str = "clotures.read";
    pub const CLOTURES_WRITE: &'static str = "clotures.write";
    pub const CAISSE_SIMULATE: &'static str = "caisse.simulate";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

const READS: &[&str] = &[
    Permission::CONFIGURATION_READ,
    Permission::CLIENTS_READ,
    Permission::VOITURES_READ,
    Permission::PLACES_READ,
    Permission::DEPENSES_READ,
    Permission::CLOTURES_READ,
];

const CAISSIER_WRITES: &[&str] = &[
    Permission::CLIENTS_WRITE,
    Permission::VOITURES_WRITE,
    Permission::PLACES_WRITE,
    Permission::DEPENSES_WRITE,
    Permission::CAISSE_SIMULATE,
];

const GUICHETIER_WRITES: &[&str] = &[Permission::CLIENTS_WRITE, Permission::PLACES_WRITE];

/// Static role → permission policy.
///
/// `admin` holds the wildcard. `caissier` runs the till but cannot change
/// fares or close months. `guichetier` sells seats and registers clients.
/// Unknown roles grant nothing.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(|r| r.as_str() == Role::ADMIN) {
        return vec![Permission::new("*")];
    }

    let mut granted: Vec<&'static str> = Vec::new();
    for role in roles {
        let extra: &[&'static str] = match role.as_str() {
            Role::CAISSIER => CAISSIER_WRITES,
            Role::GUICHETIER => GUICHETIER_WRITES,
            _ => continue,
        };
        granted.extend_from_slice(READS);
        granted.extend_from_slice(extra);
    }
    granted.sort_unstable();
    granted.dedup();
    granted.into_iter().map(Permission::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(perms: &[Permission], name: &str) -> bool {
        perms.iter().any(|p| p.as_str() == name)
    }

    #[test]
    fn admin_gets_wildcard() {
        let perms = permissions_for_roles(&[Role::new("admin")]);
        assert_eq!(perms.len(), 1);
        assert!(perms[0].is_wildcard());
    }

    #[test]
    fn caissier_cannot_close_months_or_change_fares() {
        let perms = permissions_for_roles(&[Role::new("caissier")]);
        assert!(has(&perms, Permission::DEPENSES_WRITE));
        assert!(has(&perms, Permission::CAISSE_SIMULATE));
        assert!(!has(&perms, Permission::CLOTURES_WRITE));
        assert!(!has(&perms, Permission::CONFIGURATION_WRITE));
    }

    #[test]
    fn guichetier_sells_seats_only() {
        let perms = permissions_for_roles(&[Role::new("guichetier")]);
        assert!(has(&perms, Permission::PLACES_WRITE));
        assert!(has(&perms, Permission::VOITURES_READ));
        assert!(!has(&perms, Permission::VOITURES_WRITE));
        assert!(!has(&perms, Permission::DEPENSES_WRITE));
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(permissions_for_roles(&[Role::new("viewer")]).is_empty());
    }
}
