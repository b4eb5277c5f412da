use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::permissions::{self, Permission};

/// Named group used for role-based authorization.
///
/// Group membership is the only authorization primitive besides record
/// ownership. Each known group carries a fixed permission set (see
/// [`Group::permissions`]); unknown groups grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(Cow<'static, str>);

impl Group {
    pub const PRODUCT_MODERATOR: Group = Group::from_static("Product Moderator");
    pub const CONTENT_MANAGER: Group = Group::from_static("Content Manager");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Groups with a built-in permission set.
    pub fn known() -> [Group; 2] {
        [Self::PRODUCT_MODERATOR, Self::CONTENT_MANAGER]
    }

    /// Fixed permission set bound to this group.
    pub fn permissions(&self) -> Vec<Permission> {
        if *self == Self::PRODUCT_MODERATOR {
            vec![
                permissions::catalog::CAN_UNPUBLISH_PRODUCT,
                permissions::catalog::DELETE_PRODUCT,
            ]
        } else if *self == Self::CONTENT_MANAGER {
            vec![
                permissions::blog::ADD_BLOGPOST,
                permissions::blog::CHANGE_BLOGPOST,
                permissions::blog::DELETE_BLOGPOST,
            ]
        } else {
            Vec::new()
        }
    }

    pub fn grants(&self, permission: &Permission) -> bool {
        self.permissions().contains(permission)
    }
}

impl core::fmt::Display for Group {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderator_group_grants_unpublish_and_delete() {
        let g = Group::PRODUCT_MODERATOR;
        assert!(g.grants(&permissions::catalog::CAN_UNPUBLISH_PRODUCT));
        assert!(g.grants(&permissions::catalog::DELETE_PRODUCT));
        assert!(!g.grants(&permissions::blog::ADD_BLOGPOST));
    }

    #[test]
    fn content_manager_grants_only_blog_permissions() {
        let g = Group::CONTENT_MANAGER;
        assert_eq!(g.permissions().len(), 3);
        assert!(!g.grants(&permissions::catalog::CAN_UNPUBLISH_PRODUCT));
    }

    #[test]
    fn unknown_group_grants_nothing() {
        assert!(Group::new("Visitors").permissions().is_empty());
    }

    #[test]
    fn group_names_compare_by_value() {
        assert_eq!(Group::new(String::from("Content Manager")), Group::CONTENT_MANAGER);
    }
}
