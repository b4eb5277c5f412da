use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfront_auth::BlogTarget;
use shopfront_core::{BlogPostId, DomainError, DomainResult, Entity};

const TITLE_MAX: usize = 200;

/// A blog post.
///
/// # Invariants
/// - `created_at` is assigned once, on creation.
/// - `views_count` only grows, one per detail read; it is never part of an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub content: String,
    pub preview: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub views_count: u64,
}

/// Submitted post form, used for both create and edit.
#[derive(Debug, Clone, Deserialize)]
pub struct BlogPostInput {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

impl BlogPostInput {
    pub fn validate(&self) -> DomainResult<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::field("title", "title is required"));
        }
        if title.chars().count() > TITLE_MAX {
            return Err(DomainError::field(
                "title",
                format!("ensure this value has at most {TITLE_MAX} characters"),
            ));
        }
        if self.content.trim().is_empty() {
            return Err(DomainError::field("content", "content is required"));
        }
        Ok(())
    }
}

impl BlogPost {
    pub fn create(input: BlogPostInput, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;

        Ok(Self {
            id: BlogPostId::new(),
            title: input.title.trim().to_string(),
            content: input.content,
            preview: input.preview.filter(|p| !p.trim().is_empty()),
            is_published: input.is_published,
            created_at: now,
            views_count: 0,
        })
    }

    /// Replace editable fields; creation time and view counter are kept.
    pub fn apply(&mut self, input: BlogPostInput) -> DomainResult<()> {
        input.validate()?;

        self.title = input.title.trim().to_string();
        self.content = input.content;
        self.preview = input.preview.filter(|p| !p.trim().is_empty());
        self.is_published = input.is_published;
        Ok(())
    }

    pub fn target(&self) -> BlogTarget {
        BlogTarget {
            published: self.is_published,
        }
    }
}

impl Entity for BlogPost {
    type Id = BlogPostId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, published: bool) -> BlogPostInput {
        BlogPostInput {
            title: title.to_string(),
            content: "Body".to_string(),
            preview: Some(String::new()),
            is_published: published,
        }
    }

    #[test]
    fn new_post_starts_with_zero_views() {
        let now = Utc::now();
        let post = BlogPost::create(input("Hello", true), now).unwrap();
        assert_eq!(post.views_count, 0);
        assert_eq!(post.created_at, now);
        assert_eq!(post.preview, None);
        assert!(post.target().published);
    }

    #[test]
    fn edit_keeps_counter_and_creation_time() {
        let now = Utc::now();
        let mut post = BlogPost::create(input("Hello", false), now).unwrap();
        post.views_count = 7;

        post.apply(input("Hello again", true)).unwrap();

        assert_eq!(post.title, "Hello again");
        assert!(post.is_published);
        assert_eq!(post.views_count, 7);
        assert_eq!(post.created_at, now);
    }

    #[test]
    fn empty_title_is_a_field_error() {
        let err = BlogPost::create(input("  ", true), Utc::now()).unwrap_err();
        assert_eq!(err.field_name(), Some("title"));
    }
}
