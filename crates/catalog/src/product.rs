use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shopfront_auth::ProductTarget;
use shopfront_core::{
    CategoryId, DomainError, DomainResult, Entity, FieldError, ProductId, UserId,
};

use crate::content::find_forbidden_word;

const NAME_MAX: usize = 100;

/// Publication status. New products start as drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Draft,
    Published,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "draft" => Ok(ProductStatus::Draft),
            "published" => Ok(ProductStatus::Published),
            other => Err(DomainError::validation(format!(
                "unknown product status: {other}"
            ))),
        }
    }
}

impl core::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub photo: Option<String>,
    pub category_id: CategoryId,
    pub price: i64,
    pub owner: Option<UserId>,
    pub status: ProductStatus,
    pub created_at: NaiveDate,
    pub updated_at: NaiveDate,
}

/// Submitted product form, used for both create and update.
///
/// Dates are business dates; when omitted they default to the current day
/// (`created_at` only on create).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photo: Option<String>,
    pub category_id: CategoryId,
    pub price: i64,
    #[serde(default)]
    pub created_at: Option<NaiveDate>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

impl ProductInput {
    /// Field-level validation, reporting every rejected field. Category
    /// existence is checked by the caller, which owns the store.
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("name", "product name is required"));
        } else if name.chars().count() > NAME_MAX {
            errors.push(FieldError::new(
                "name",
                format!("ensure this value has at most {NAME_MAX} characters"),
            ));
        } else if let Some(word) = find_forbidden_word(&self.name) {
            errors.push(FieldError::new(
                "name",
                format!("product name contains forbidden word \"{word}\""),
            ));
        }
        if let Some(word) = find_forbidden_word(&self.description) {
            errors.push(FieldError::new(
                "description",
                format!("product description contains forbidden word \"{word}\""),
            ));
        }
        if self.price < 0 {
            errors.push(FieldError::new("price", "price must not be negative"));
        }

        DomainError::check_fields(errors)
    }
}

impl Product {
    /// Build a new draft product owned by `owner`.
    pub fn create(input: ProductInput, owner: UserId, today: NaiveDate) -> DomainResult<Self> {
        input.validate()?;

        Ok(Self {
            id: ProductId::new(),
            name: input.name.trim().to_string(),
            description: input.description,
            photo: input.photo.filter(|p| !p.trim().is_empty()),
            category_id: input.category_id,
            price: input.price,
            owner: Some(owner),
            status: ProductStatus::Draft,
            created_at: input.created_at.unwrap_or(today),
            updated_at: input.updated_at.unwrap_or(today),
        })
    }

    /// Replace the editable fields. Owner and status are never touched here.
    pub fn apply(&mut self, input: ProductInput, today: NaiveDate) -> DomainResult<()> {
        input.validate()?;

        self.name = input.name.trim().to_string();
        self.description = input.description;
        self.photo = input.photo.filter(|p| !p.trim().is_empty());
        self.category_id = input.category_id;
        self.price = input.price;
        if let Some(created_at) = input.created_at {
            self.created_at = created_at;
        }
        self.updated_at = input.updated_at.unwrap_or(today);
        Ok(())
    }

    pub fn is_published(&self) -> bool {
        self.status == ProductStatus::Published
    }

    /// Facts the access policy needs about this product.
    pub fn target(&self) -> ProductTarget {
        ProductTarget {
            owner: self.owner,
            published: self.is_published(),
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn input(name: &str, price: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: "A thing".to_string(),
            photo: None,
            category_id: CategoryId::new(),
            price,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn create_assigns_owner_and_draft_status() {
        let owner = UserId::new();
        let p = Product::create(input("Laptop", 1000), owner, today()).unwrap();
        assert_eq!(p.owner, Some(owner));
        assert_eq!(p.status, ProductStatus::Draft);
        assert_eq!(p.created_at, today());
        assert_eq!(p.updated_at, today());
        assert!(!p.target().published);
    }

    #[test]
    fn forbidden_word_in_name_is_named_in_the_error() {
        let err = Product::create(input("дешево товар", 10), UserId::new(), today()).unwrap_err();
        assert_eq!(err.field_name(), Some("name"));
        assert!(err.to_string().contains("дешево"));
    }

    #[test]
    fn forbidden_word_in_description_is_rejected() {
        let mut i = input("Phone", 10);
        i.description = "Лучше, чем БИРЖА".to_string();
        let err = Product::create(i, UserId::new(), today()).unwrap_err();
        assert_eq!(err.field_name(), Some("description"));
        assert!(err.to_string().contains("биржа"));
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = Product::create(input("Phone", -1), UserId::new(), today()).unwrap_err();
        assert_eq!(err.field_name(), Some("price"));

        assert!(Product::create(input("Free phone", 0), UserId::new(), today()).is_ok());
    }

    #[test]
    fn every_rejected_field_is_reported() {
        let mut i = input("дешево товар", -1);
        i.description = "бесплатно".to_string();
        let err = Product::create(i, UserId::new(), today()).unwrap_err();

        let DomainError::InvalidFields(fields) = err else {
            panic!("expected several field errors, got {err:?}");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field).collect();
        assert_eq!(names, vec!["name", "description", "price"]);
        assert!(fields[0].message.contains("дешево"));
    }

    #[test]
    fn apply_keeps_owner_and_status() {
        let owner = UserId::new();
        let mut p = Product::create(input("Laptop", 1000), owner, today()).unwrap();
        p.status = ProductStatus::Published;

        let later = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        p.apply(input("Laptop Pro", 1500), later).unwrap();

        assert_eq!(p.name, "Laptop Pro");
        assert_eq!(p.price, 1500);
        assert_eq!(p.owner, Some(owner));
        assert_eq!(p.status, ProductStatus::Published);
        assert_eq!(p.created_at, today());
        assert_eq!(p.updated_at, later);
    }

    #[test]
    fn rejected_update_leaves_product_untouched() {
        let mut p = Product::create(input("Laptop", 1000), UserId::new(), today()).unwrap();
        let before = p.clone();
        assert!(p.apply(input("казино", 1), today()).is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn status_parses_its_own_names() {
        for s in [ProductStatus::Draft, ProductStatus::Published] {
            assert_eq!(ProductStatus::parse(s.as_str()).unwrap(), s);
        }
        assert!(ProductStatus::parse("archived").is_err());
    }
}
