//! Catalog domain: categories, products, content rules and moderation.
//!
//! Pure domain logic; storage lives in `shopfront-infra`.

pub mod category;
pub mod content;
pub mod moderation;
pub mod product;

pub use category::{Category, NewCategory};
pub use content::{find_forbidden_word, FORBIDDEN_WORDS};
pub use moderation::{unpublish, Unpublish};
pub use product::{Product, ProductInput, ProductStatus};
