use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::cars::repo_types::{Car, CarPatch, CarRow, CarStatus};
use crate::error::AppResult;

#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn insert(&self, car: Car) -> AppResult<Car>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Car>>;
    /// Every car, in no particular order.
    async fn find_all(&self) -> AppResult<Vec<Car>>;
    /// Cars of one provider, highest id first.
    async fn find_by_provider(&self, provider_email: &str) -> AppResult<Vec<Car>>;
    /// Newest cars by `created_at`, at most `limit`.
    async fn find_recent(&self, limit: usize) -> AppResult<Vec<Car>>;
    /// Returns `false` when no car has this id, or when `patch.expected_status`
    /// no longer matches the stored status.
    async fn update(&self, id: Uuid, patch: CarPatch) -> AppResult<bool>;
    /// Compare-and-set when `expected` is given; `false` if nothing was written.
    async fn set_status(
        &self,
        id: Uuid,
        expected: Option<&CarStatus>,
        status: &CarStatus,
    ) -> AppResult<bool>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgCarRepository {
    db: PgPool,
}

impl PgCarRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CarRepository for PgCarRepository {
    async fn insert(&self, car: Car) -> AppResult<Car> {
        let row = sqlx::query_as::<_, CarRow>(
            r#"
            INSERT INTO cars (id, provider_email, status, attributes, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, provider_email, status, attributes, created_at
            "#,
        )
        .bind(car.id)
        .bind(&car.provider_email)
        .bind(car.status.as_str())
        .bind(Json(&car.attributes))
        .bind(car.created_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Car>> {
        let row = sqlx::query_as::<_, CarRow>(
            r#"
            SELECT id, provider_email, status, attributes, created_at
            FROM cars
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Car::from))
    }

    async fn find_all(&self) -> AppResult<Vec<Car>> {
        let rows = sqlx::query_as::<_, CarRow>(
            r#"
            SELECT id, provider_email, status, attributes, created_at
            FROM cars
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Car::from).collect())
    }

    async fn find_by_provider(&self, provider_email: &str) -> AppResult<Vec<Car>> {
        let rows = sqlx::query_as::<_, CarRow>(
            r#"
            SELECT id, provider_email, status, attributes, created_at
            FROM cars
            WHERE provider_email = $1
            ORDER BY id DESC
            "#,
        )
        .bind(provider_email)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Car::from).collect())
    }

    async fn find_recent(&self, limit: usize) -> AppResult<Vec<Car>> {
        let rows = sqlx::query_as::<_, CarRow>(
            r#"
            SELECT id, provider_email, status, attributes, created_at
            FROM cars
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Car::from).collect())
    }

    async fn update(&self, id: Uuid, patch: CarPatch) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cars
               SET provider_email = COALESCE($2, provider_email),
                   status = COALESCE($3, status),
                   attributes = attributes || $4
             WHERE id = $1
               AND ($5::text IS NULL OR status = $5)
            "#,
        )
        .bind(id)
        .bind(patch.provider_email.as_deref())
        .bind(patch.status.as_ref().map(CarStatus::as_str))
        .bind(Json(&patch.attributes))
        .bind(patch.expected_status.as_ref().map(CarStatus::as_str))
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: Uuid,
        expected: Option<&CarStatus>,
        status: &CarStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cars
               SET status = $2
             WHERE id = $1
               AND ($3::text IS NULL OR status = $3)
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(expected.map(CarStatus::as_str))
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
