use serde::{Deserialize, Serialize};

use shopfront_core::{CategoryId, DomainError, DomainResult, Entity};

const NAME_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Category {
    pub fn create(input: NewCategory) -> DomainResult<Self> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::field("name", "category name is required"));
        }
        if name.chars().count() > NAME_MAX {
            return Err(DomainError::field(
                "name",
                format!("ensure this value has at most {NAME_MAX} characters"),
            ));
        }

        Ok(Self {
            id: CategoryId::new(),
            name,
            description: input.description,
        })
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_required() {
        let c = Category::create(NewCategory {
            name: "  Phones ".to_string(),
            description: String::new(),
        })
        .unwrap();
        assert_eq!(c.name, "Phones");

        let err = Category::create(NewCategory {
            name: "   ".to_string(),
            description: String::new(),
        })
        .unwrap_err();
        assert_eq!(err.field_name(), Some("name"));
    }
}
