use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings of the form `"<app>.<codename>"`
/// (e.g. `"catalog.can_unpublish_product"`). They are never granted to users
/// directly: a permission reaches an actor only through group membership or the
/// superuser flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog permissions.
pub mod catalog {
    use super::Permission;

    pub const CAN_UNPUBLISH_PRODUCT: Permission =
        Permission::from_static("catalog.can_unpublish_product");
    pub const DELETE_PRODUCT: Permission = Permission::from_static("catalog.delete_product");
}

/// Blog permissions.
pub mod blog {
    use super::Permission;

    pub const ADD_BLOGPOST: Permission = Permission::from_static("blog.add_blogpost");
    pub const CHANGE_BLOGPOST: Permission = Permission::from_static("blog.change_blogpost");
    pub const DELETE_BLOGPOST: Permission = Permission::from_static("blog.delete_blogpost");
}

/// Every permission known to the system, in display order.
pub fn all() -> [Permission; 5] {
    [
        catalog::CAN_UNPUBLISH_PRODUCT,
        catalog::DELETE_PRODUCT,
        blog::ADD_BLOGPOST,
        blog::CHANGE_BLOGPOST,
        blog::DELETE_BLOGPOST,
    ]
}
