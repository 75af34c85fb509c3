use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::UserRepository;
use crate::auth::repo_types::{User, UserSummary};
use crate::error::{AppError, AppResult};
use crate::ids::new_id;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Emails are compared and stored trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Unique-by-email user accounts.
#[derive(Clone)]
pub struct UserRegistry {
    repo: Arc<dyn UserRepository>,
}

impl UserRegistry {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: Option<&str>,
    ) -> AppResult<Uuid> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::Validation("email is required".into()));
        }
        if !is_valid_email(&email) {
            return Err(AppError::Validation("Invalid email".into()));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }

        // Fast path; the repository still enforces uniqueness on insert.
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".into()));
        }

        let user = User {
            id: new_id(),
            name: name.to_string(),
            email,
            password_hash: hash_password(password)?,
            created_at: OffsetDateTime::now_utc(),
        };
        let user = self.repo.insert(user).await?;
        Ok(user.id)
    }

    pub async fn authenticate(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> AppResult<UserSummary> {
        let email = normalize_email(email);
        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let password = password.filter(|p| !p.is_empty());
        match (password, user.password_hash.as_deref()) {
            (None, None) => {}
            (Some(_), None) => return Err(AppError::SocialAccountMismatch),
            (None, Some(_)) => return Err(AppError::InvalidCredentials),
            (Some(plain), hash @ Some(_)) => {
                if !verify_password(plain, hash)? {
                    return Err(AppError::InvalidCredentials);
                }
            }
        }
        Ok(user.into())
    }
}
