//! Blog domain: posts, publication flag and view counter.

pub mod post;

pub use post::{BlogPost, BlogPostInput};
