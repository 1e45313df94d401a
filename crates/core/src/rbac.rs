//! Capability evaluation for role-based access control.
//!
//! Pure logic. The api crate loads a [`Principal`] (account flags plus the
//! union of permissions from non-expired role assignments) and asks
//! [`authorize`] whether a [`Requirement`] holds.
//!
//! Precedence:
//! 1. inactive accounts are denied outright,
//! 2. superusers bypass every check,
//! 3. explicit named permissions,
//! 4. resource + action + ownership,
//! 5. fallback: an active account is enough.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::roles::{actions, permission_name};
use crate::types::DbId;

/// The authenticated caller as seen by the RBAC evaluator.
#[derive(Debug, Clone, Default)]
pub struct Principal {
    pub user_id: DbId,
    pub is_active: bool,
    pub is_admin: bool,
    pub is_superuser: bool,
    /// Effective `resource:action` permission names.
    pub permissions: HashSet<String>,
}

impl Principal {
    /// True when the principal holds `name` directly, or holds the
    /// `resource:manage` permission covering it.
    pub fn has_permission(&self, name: &str) -> bool {
        if self.permissions.contains(name) {
            return true;
        }
        match name.split_once(':') {
            Some((resource, _)) => self
                .permissions
                .contains(&permission_name(resource, actions::MANAGE)),
            None => false,
        }
    }

    /// Admins and superusers may act on resources owned by other users.
    pub fn bypasses_ownership(&self) -> bool {
        self.is_admin || self.is_superuser
    }
}

/// A capability the caller must hold.
#[derive(Debug, Clone, Copy)]
pub enum Requirement<'a> {
    /// A named permission such as `system:read`.
    Permission(&'a str),
    /// `resource:action`, optionally scoped to a resource owned by `owner_id`.
    Resource {
        resource: &'a str,
        action: &'a str,
        owner_id: Option<DbId>,
    },
    /// Any active account.
    ActiveAccount,
}

/// Returns `true` when the principal may act on a resource owned by `owner_id`.
pub fn check_ownership(principal: &Principal, owner_id: DbId) -> bool {
    owner_id == principal.user_id || principal.bypasses_ownership()
}

/// Evaluate a requirement against a principal.
///
/// Every denial is reported as [`CoreError::InsufficientPermission`].
pub fn authorize(principal: &Principal, requirement: Requirement<'_>) -> Result<(), CoreError> {
    if !principal.is_active {
        return Err(denied("active account"));
    }
    if principal.is_superuser {
        return Ok(());
    }

    match requirement {
        Requirement::Permission(name) => {
            if principal.has_permission(name) {
                Ok(())
            } else {
                Err(denied(name))
            }
        }
        Requirement::Resource {
            resource,
            action,
            owner_id,
        } => {
            let name = permission_name(resource, action);
            if !principal.has_permission(&name) {
                return Err(denied(&name));
            }
            match owner_id {
                Some(owner) if !check_ownership(principal, owner) => {
                    Err(denied(&format!("ownership of {resource}")))
                }
                _ => Ok(()),
            }
        }
        Requirement::ActiveAccount => Ok(()),
    }
}

fn denied(required: &str) -> CoreError {
    CoreError::InsufficientPermission {
        required: required.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::roles::resources;

    fn principal(user_id: DbId, perms: &[&str]) -> Principal {
        Principal {
            user_id,
            is_active: true,
            is_admin: false,
            is_superuser: false,
            permissions: perms.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn ownership_denied_for_other_owner() {
        let p = principal(1, &[]);
        assert!(!check_ownership(&p, 2));
    }

    #[test]
    fn ownership_allowed_for_owner_admin_and_superuser() {
        let owner = principal(1, &[]);
        assert!(check_ownership(&owner, 1));

        let admin = Principal {
            is_admin: true,
            ..principal(7, &[])
        };
        assert!(check_ownership(&admin, 1));

        let superuser = Principal {
            is_superuser: true,
            ..principal(8, &[])
        };
        assert!(check_ownership(&superuser, 1));
    }

    #[test]
    fn superuser_bypasses_named_permissions() {
        let p = Principal {
            is_superuser: true,
            ..principal(1, &[])
        };
        assert!(authorize(&p, Requirement::Permission("roles:manage")).is_ok());
    }

    #[test]
    fn inactive_superuser_is_denied() {
        let p = Principal {
            is_superuser: true,
            is_active: false,
            ..principal(1, &[])
        };
        assert_matches!(
            authorize(&p, Requirement::ActiveAccount),
            Err(CoreError::InsufficientPermission { .. })
        );
    }

    #[test]
    fn named_permission_checked_directly() {
        let p = principal(1, &["system:read"]);
        assert!(authorize(&p, Requirement::Permission("system:read")).is_ok());
        assert_matches!(
            authorize(&p, Requirement::Permission("system:manage")),
            Err(CoreError::InsufficientPermission { required }) if required == "system:manage"
        );
    }

    #[test]
    fn manage_permission_covers_every_action() {
        let p = principal(1, &["hands:manage"]);
        assert!(p.has_permission("hands:delete"));
        assert!(!p.has_permission("statistics:read"));
    }

    #[test]
    fn resource_requires_permission_even_for_owner() {
        let p = principal(1, &["hands:read"]);
        let req = Requirement::Resource {
            resource: resources::HANDS,
            action: "delete",
            owner_id: Some(1),
        };
        assert!(authorize(&p, req).is_err());
    }

    #[test]
    fn resource_owned_by_other_user_is_denied() {
        let p = principal(1, &["hands:read"]);
        let req = Requirement::Resource {
            resource: resources::HANDS,
            action: "read",
            owner_id: Some(2),
        };
        assert_matches!(
            authorize(&p, req),
            Err(CoreError::InsufficientPermission { .. })
        );
    }

    #[test]
    fn admin_reads_other_users_resource() {
        let p = Principal {
            is_admin: true,
            ..principal(1, &["hands:read"])
        };
        let req = Requirement::Resource {
            resource: resources::HANDS,
            action: "read",
            owner_id: Some(2),
        };
        assert!(authorize(&p, req).is_ok());
    }

    #[test]
    fn active_account_fallback() {
        let p = principal(1, &[]);
        assert!(authorize(&p, Requirement::ActiveAccount).is_ok());
    }
}
