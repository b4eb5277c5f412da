//! User accounts: registration, profile updates, and the bridge to [`Actor`].
//!
//! Email is the login identifier. It is normalized (trimmed, lowercased)
//! before it is stored or compared, so uniqueness holds case-insensitively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfront_core::{DomainError, DomainResult, Entity, UserId};

use crate::{Actor, Group, PasswordHash};

const PHONE_NUMBER_MAX: usize = 15;
const COUNTRY_MAX: usize = 100;
const NAME_MAX: usize = 150;

/// Trimmed, lowercased email.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate_email(email: &str) -> DomainResult<()> {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::field("email", "enter a valid email address")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

/// Registration form as submitted.
#[derive(Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl core::fmt::Debug for Registration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Full replacement of the editable profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: PasswordHash,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub groups: Vec<Group>,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Validate a registration form and build a fresh, active account with no
    /// groups. Uniqueness of the email is the store's concern.
    pub fn register(form: Registration, now: DateTime<Utc>) -> DomainResult<Self> {
        let email = normalize_email(&form.email);
        validate_email(&email)?;

        if form.password.is_empty() {
            return Err(DomainError::field("password", "password is required"));
        }
        if form.password != form.password_confirmation {
            return Err(DomainError::field(
                "password_confirmation",
                "the two password fields didn't match",
            ));
        }

        let password_hash = PasswordHash::generate(&form.password)
            .map_err(|err| DomainError::field("password", err.to_string()))?;

        Ok(Self {
            id: UserId::new(),
            email,
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            phone_number: None,
            country: None,
            avatar: None,
            groups: Vec::new(),
            is_superuser: false,
            is_active: true,
            date_joined: now,
        })
    }

    /// Active accounts whose password matches.
    pub fn check_password(&self, password: &str) -> bool {
        self.is_active && self.password_hash.verify(password)
    }

    pub fn apply_profile(&mut self, update: ProfileUpdate) -> DomainResult<()> {
        let ProfileUpdate {
            first_name,
            last_name,
            phone_number,
            country,
            avatar,
        } = update;

        check_len("first_name", &first_name, NAME_MAX)?;
        check_len("last_name", &last_name, NAME_MAX)?;
        let phone_number = blank_to_none(phone_number);
        if let Some(phone) = &phone_number {
            check_len("phone_number", phone, PHONE_NUMBER_MAX)?;
        }
        let country = blank_to_none(country);
        if let Some(country) = &country {
            check_len("country", country, COUNTRY_MAX)?;
        }

        self.first_name = first_name.trim().to_string();
        self.last_name = last_name.trim().to_string();
        self.phone_number = phone_number;
        self.country = country;
        self.avatar = blank_to_none(avatar);
        Ok(())
    }

    pub fn to_actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            email: self.email.clone(),
            groups: self.groups.clone(),
            is_superuser: self.is_superuser,
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> DomainResult<()> {
    if value.trim().chars().count() > max {
        return Err(DomainError::field(
            field,
            format!("ensure this value has at most {max} characters"),
        ));
    }
    Ok(())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, password: &str, confirmation: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: password.to_string(),
            password_confirmation: confirmation.to_string(),
        }
    }

    #[test]
    fn registration_normalizes_email() {
        let user = User::register(form("  Alice@Example.COM ", "pw", "pw"), Utc::now()).unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(user.is_active);
        assert!(!user.is_superuser);
        assert!(user.groups.is_empty());
        assert!(user.check_password("pw"));
    }

    #[test]
    fn mismatched_confirmation_is_a_field_error() {
        let err = User::register(form("a@b.c", "pw", "other"), Utc::now()).unwrap_err();
        assert_eq!(err.field_name(), Some("password_confirmation"));
    }

    #[test]
    fn empty_password_is_rejected() {
        let err = User::register(form("a@b.c", "", ""), Utc::now()).unwrap_err();
        assert_eq!(err.field_name(), Some("password"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        for bad in ["", "nobody", "@example.com", "a@", "a@b@c"] {
            let err = User::register(form(bad, "pw", "pw"), Utc::now()).unwrap_err();
            assert_eq!(err.field_name(), Some("email"), "{bad:?}");
        }
    }

    #[test]
    fn inactive_user_cannot_authenticate() {
        let mut user = User::register(form("a@b.c", "pw", "pw"), Utc::now()).unwrap();
        user.is_active = false;
        assert!(!user.check_password("pw"));
    }

    #[test]
    fn profile_phone_number_is_bounded() {
        let mut user = User::register(form("a@b.c", "pw", "pw"), Utc::now()).unwrap();
        let err = user
            .apply_profile(ProfileUpdate {
                phone_number: Some("1234567890123456".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.field_name(), Some("phone_number"));
        assert_eq!(user.phone_number, None);

        user.apply_profile(ProfileUpdate {
            first_name: " Ann ".to_string(),
            phone_number: Some("+12345678901234".to_string()),
            country: Some("  ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(user.first_name, "Ann");
        assert_eq!(user.phone_number.as_deref(), Some("+12345678901234"));
        assert_eq!(user.country, None);
    }

    #[test]
    fn actor_mirrors_user_roles() {
        let mut user = User::register(form("a@b.c", "pw", "pw"), Utc::now()).unwrap();
        user.groups.push(Group::CONTENT_MANAGER);
        let actor = user.to_actor();
        assert_eq!(actor.user_id, user.id);
        assert!(actor.is_content_manager());
        assert!(!actor.is_product_moderator());
    }
}
