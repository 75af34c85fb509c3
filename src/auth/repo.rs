use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::User;
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by exact email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Persist a new user. Fails with `Conflict` when the email is taken,
    /// even if a concurrent insert won the race after our lookup.
    async fn insert(&self, user: User) -> AppResult<User>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: User) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("User already exists".into())
            }
            other => AppError::StorageUnavailable(other),
        })?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(email: &str) -> User {
        User {
            id: crate::ids::new_id(),
            name: "A".into(),
            email: email.into(),
            password_hash: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[sqlx::test]
    #[ignore = "needs DATABASE_URL"]
    async fn unique_constraint_reports_conflict(pool: PgPool) -> anyhow::Result<()> {
        let repo = PgUserRepository::new(pool);
        repo.insert(user("a@x.com")).await?;

        let err = repo.insert(user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let found = repo.find_by_email("a@x.com").await?.expect("user stored");
        assert_eq!(found.name, "A");
        assert!(found.password_hash.is_none());
        Ok(())
    }
}
