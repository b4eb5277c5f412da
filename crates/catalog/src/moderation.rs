//! Product moderation state machine.
//!
//! Two states, `Published` and `Draft`. Only `Published -> Draft` (unpublish)
//! is defined; approving a draft is outside this workflow.

use crate::ProductStatus;

/// Result of an unpublish request against a product's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unpublish {
    /// The status must be written as `Draft`.
    Transition,
    /// Already a draft; nothing to persist.
    AlreadyDraft,
}

impl Unpublish {
    pub fn next_status(&self) -> ProductStatus {
        ProductStatus::Draft
    }

    pub fn needs_write(&self) -> bool {
        matches!(self, Unpublish::Transition)
    }
}

pub fn unpublish(current: ProductStatus) -> Unpublish {
    match current {
        ProductStatus::Published => Unpublish::Transition,
        ProductStatus::Draft => Unpublish::AlreadyDraft,
    }
}
