//! Access policy: one fixed predicate per protected action.
//!
//! Every function takes the actor (or `None` for an anonymous viewer) and the
//! facts about the target it needs, and returns a [`Decision`]. List predicates
//! return a plain `bool` instead: a hidden record is silently omitted, never
//! reported as forbidden.
//!
//! Predicates are composed by calling them, not by layering; no predicate
//! consults another action's rule.

use std::borrow::Cow;

use serde::Serialize;

use shopfront_core::UserId;

use crate::permissions::catalog::CAN_UNPUBLISH_PRODUCT;
use crate::{authorize, Actor};

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum Denial {
    /// The action requires an authenticated actor.
    Unauthenticated,
    /// The actor is known but not allowed to perform the action.
    Forbidden(Cow<'static, str>),
}

impl core::fmt::Display for Denial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Denial::Unauthenticated => f.write_str("authentication required"),
            Denial::Forbidden(reason) => f.write_str(reason),
        }
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Allowed; the target has no owner and the actor must be recorded as its
    /// owner before the action proceeds.
    AllowClaimingOwnership,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Deny(_))
    }

    /// Collapse into a `Result`, discarding the ownership-claim distinction.
    pub fn check(self) -> Result<(), Denial> {
        match self {
            Decision::Allow | Decision::AllowClaimingOwnership => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }

    fn forbidden(reason: &'static str) -> Self {
        Decision::Deny(Denial::Forbidden(Cow::Borrowed(reason)))
    }
}

/// The product facts the policy looks at.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProductTarget {
    pub owner: Option<UserId>,
    pub published: bool,
}

/// The blog post facts the policy looks at.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlogTarget {
    pub published: bool,
}

fn owned_by(target: &ProductTarget, actor: &Actor) -> bool {
    target.owner == Some(actor.user_id)
}

/// Product list visibility: published products for everyone, plus the viewer's
/// own products when authenticated.
pub fn product_listed(viewer: Option<&Actor>, target: &ProductTarget) -> bool {
    target.published || viewer.is_some_and(|actor| owned_by(target, actor))
}

/// Any authenticated actor may view any product, whatever its status.
pub fn view_product(viewer: Option<&Actor>) -> Decision {
    match viewer {
        Some(_) => Decision::Allow,
        None => Decision::Deny(Denial::Unauthenticated),
    }
}

/// Any authenticated actor may create a product (and becomes its owner).
pub fn create_product(viewer: Option<&Actor>) -> Decision {
    view_product(viewer)
}

/// Only the owner may edit. An ownerless product is claimed by the first actor
/// who tries to edit it.
pub fn edit_product(viewer: Option<&Actor>, target: &ProductTarget) -> Decision {
    let Some(actor) = viewer else {
        return Decision::Deny(Denial::Unauthenticated);
    };

    match target.owner {
        None => Decision::AllowClaimingOwnership,
        Some(_) if owned_by(target, actor) => Decision::Allow,
        Some(_) => Decision::forbidden("you are not the owner of this product"),
    }
}

/// The owner or a product moderator may delete. An ownerless product can only be
/// deleted by a moderator; deleting never claims ownership.
pub fn delete_product(viewer: Option<&Actor>, target: &ProductTarget) -> Decision {
    let Some(actor) = viewer else {
        return Decision::Deny(Denial::Unauthenticated);
    };

    if actor.is_product_moderator() || owned_by(target, actor) {
        Decision::Allow
    } else {
        Decision::forbidden("insufficient rights to delete this product")
    }
}

/// Unpublishing requires the explicit unpublish permission.
pub fn unpublish_product(viewer: Option<&Actor>) -> Decision {
    let Some(actor) = viewer else {
        return Decision::Deny(Denial::Unauthenticated);
    };

    match authorize(actor, &CAN_UNPUBLISH_PRODUCT) {
        Ok(()) => Decision::Allow,
        Err(e) => Decision::Deny(Denial::Forbidden(Cow::Owned(e.to_string()))),
    }
}

/// Blog list visibility: published posts only, for everyone.
pub fn blog_listed(target: &BlogTarget) -> bool {
    target.published
}

/// Anyone may read a blog post by id.
pub fn view_blog_post(_viewer: Option<&Actor>) -> Decision {
    Decision::Allow
}

/// Creating, editing and deleting blog posts is reserved to content managers.
pub fn manage_blog(viewer: Option<&Actor>) -> Decision {
    let Some(actor) = viewer else {
        return Decision::Deny(Denial::Unauthenticated);
    };

    if actor.is_content_manager() {
        Decision::Allow
    } else {
        Decision::forbidden("only content managers may manage blog posts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Group;
    use proptest::prelude::*;

    fn actor(groups: Vec<Group>) -> Actor {
        Actor {
            user_id: UserId::new(),
            email: "user@example.com".to_string(),
            groups,
            is_superuser: false,
        }
    }

    fn superuser() -> Actor {
        Actor {
            is_superuser: true,
            ..actor(vec![])
        }
    }

    fn owned(owner: &Actor, published: bool) -> ProductTarget {
        ProductTarget {
            owner: Some(owner.user_id),
            published,
        }
    }

    #[test]
    fn anonymous_sees_only_published_products() {
        let owner = actor(vec![]);
        assert!(product_listed(None, &owned(&owner, true)));
        assert!(!product_listed(None, &owned(&owner, false)));
    }

    #[test]
    fn owner_sees_own_drafts_others_do_not() {
        let owner = actor(vec![]);
        let other = actor(vec![]);
        let draft = owned(&owner, false);
        assert!(product_listed(Some(&owner), &draft));
        assert!(!product_listed(Some(&other), &draft));
    }

    #[test]
    fn moderators_do_not_see_foreign_drafts_in_lists() {
        let owner = actor(vec![]);
        let moderator = actor(vec![Group::PRODUCT_MODERATOR]);
        assert!(!product_listed(Some(&moderator), &owned(&owner, false)));
    }

    #[test]
    fn product_detail_requires_authentication_only() {
        assert_eq!(view_product(None), Decision::Deny(Denial::Unauthenticated));
        assert_eq!(view_product(Some(&actor(vec![]))), Decision::Allow);
    }

    #[test]
    fn edit_ownerless_product_claims_ownership() {
        let u = actor(vec![]);
        let target = ProductTarget {
            owner: None,
            published: true,
        };
        assert_eq!(edit_product(Some(&u), &target), Decision::AllowClaimingOwnership);
        assert_eq!(edit_product(None, &target), Decision::Deny(Denial::Unauthenticated));
    }

    #[test]
    fn edit_requires_ownership_even_for_superusers() {
        let owner = actor(vec![]);
        let target = owned(&owner, true);
        assert_eq!(edit_product(Some(&owner), &target), Decision::Allow);
        assert!(!edit_product(Some(&actor(vec![Group::PRODUCT_MODERATOR])), &target).is_allowed());
        assert!(!edit_product(Some(&superuser()), &target).is_allowed());
    }

    #[test]
    fn delete_allowed_for_owner_or_moderator() {
        let owner = actor(vec![]);
        let target = owned(&owner, true);
        assert_eq!(delete_product(Some(&owner), &target), Decision::Allow);
        assert_eq!(
            delete_product(Some(&actor(vec![Group::PRODUCT_MODERATOR])), &target),
            Decision::Allow
        );
        assert_eq!(delete_product(Some(&superuser()), &target), Decision::Allow);
        assert!(matches!(
            delete_product(Some(&actor(vec![])), &target),
            Decision::Deny(Denial::Forbidden(_))
        ));
    }

    #[test]
    fn delete_ownerless_requires_moderator_and_never_claims() {
        let target = ProductTarget {
            owner: None,
            published: false,
        };
        assert!(!delete_product(Some(&actor(vec![])), &target).is_allowed());
        assert_eq!(
            delete_product(Some(&actor(vec![Group::PRODUCT_MODERATOR])), &target),
            Decision::Allow
        );
    }

    #[test]
    fn unpublish_requires_permission() {
        assert_eq!(unpublish_product(None), Decision::Deny(Denial::Unauthenticated));
        assert!(!unpublish_product(Some(&actor(vec![Group::CONTENT_MANAGER]))).is_allowed());
        assert_eq!(
            unpublish_product(Some(&actor(vec![Group::PRODUCT_MODERATOR]))),
            Decision::Allow
        );
        assert_eq!(unpublish_product(Some(&superuser())), Decision::Allow);
    }

    #[test]
    fn blog_rules() {
        assert!(blog_listed(&BlogTarget { published: true }));
        assert!(!blog_listed(&BlogTarget { published: false }));
        assert_eq!(view_blog_post(None), Decision::Allow);
        assert_eq!(manage_blog(None), Decision::Deny(Denial::Unauthenticated));
        assert!(!manage_blog(Some(&actor(vec![Group::PRODUCT_MODERATOR]))).is_allowed());
        assert_eq!(manage_blog(Some(&actor(vec![Group::CONTENT_MANAGER]))), Decision::Allow);
        assert_eq!(manage_blog(Some(&superuser())), Decision::Allow);
    }

    #[test]
    fn denial_check_keeps_reason() {
        let err = manage_blog(Some(&actor(vec![]))).check().unwrap_err();
        assert_eq!(err.to_string(), "only content managers may manage blog posts");
    }

    proptest! {
        #[test]
        fn anonymous_list_visibility_equals_published(published in any::<bool>(), has_owner in any::<bool>()) {
            let target = ProductTarget {
                owner: has_owner.then(UserId::new),
                published,
            };
            prop_assert_eq!(product_listed(None, &target), published);
        }

        #[test]
        fn authenticated_list_visibility_is_published_or_owned(published in any::<bool>(), viewer_owns in any::<bool>()) {
            let viewer = actor(vec![]);
            let target = ProductTarget {
                owner: Some(if viewer_owns { viewer.user_id } else { UserId::new() }),
                published,
            };
            prop_assert_eq!(product_listed(Some(&viewer), &target), published || viewer_owns);
        }
    }
}
