use std::collections::BTreeSet;

use serde::Serialize;

use shopfront_core::UserId;

use crate::{Group, Permission};

/// A fully resolved, authenticated actor for authorization decisions.
///
/// Construction of this object is intentionally decoupled from storage and
/// transport: the API derives it from a validated session and the user record.
/// An anonymous viewer is represented as `Option<&Actor>::None` by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: UserId,
    pub email: String,
    pub groups: Vec<Group>,
    pub is_superuser: bool,
}

impl Actor {
    /// Group check. Superusers are implicitly members of every group.
    pub fn in_group(&self, group: &Group) -> bool {
        self.is_superuser || self.groups.contains(group)
    }

    /// Permission check through group membership. Superusers hold every permission.
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.is_superuser || self.groups.iter().any(|g| g.grants(permission))
    }

    /// Superuser, or member of the "Product Moderator" group.
    pub fn is_product_moderator(&self) -> bool {
        self.in_group(&Group::PRODUCT_MODERATOR)
    }

    /// Superuser, or member of the "Content Manager" group.
    pub fn is_content_manager(&self) -> bool {
        self.in_group(&Group::CONTENT_MANAGER)
    }

    /// Sorted, de-duplicated permission set.
    pub fn effective_permissions(&self) -> Vec<Permission> {
        if self.is_superuser {
            return crate::permissions::all().into_iter().collect();
        }

        self.groups
            .iter()
            .flat_map(Group::permissions)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
