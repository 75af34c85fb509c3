use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::bookings::repo_types::{Booking, BookingRow};
use crate::error::AppResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: Booking) -> AppResult<Booking>;
    /// Bookings made by `email`, in no particular order.
    async fn find_by_renter(&self, email: &str) -> AppResult<Vec<Booking>>;
}

#[derive(Clone)]
pub struct PgBookingRepository {
    db: PgPool,
}

impl PgBookingRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert(&self, booking: Booking) -> AppResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (id, car_id, booked_by, attributes, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, car_id, booked_by, attributes, created_at
            "#,
        )
        .bind(booking.id)
        .bind(booking.car_id)
        .bind(&booking.booked_by)
        .bind(Json(&booking.attributes))
        .bind(booking.created_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn find_by_renter(&self, email: &str) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, car_id, booked_by, attributes, created_at
            FROM bookings
            WHERE booked_by = $1
            "#,
        )
        .bind(email)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Booking::from).collect())
    }
}
