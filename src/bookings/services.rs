use std::sync::Arc;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::services::normalize_email;
use crate::bookings::repo::BookingRepository;
use crate::bookings::repo_types::Booking;
use crate::error::{AppError, AppResult};
use crate::ids::{new_id, parse_id};

const RESERVED_KEYS: [&str; 6] = ["id", "_id", "createdAt", "carId", "bookedBy", "userEmail"];

/// Append-only record of booking requests.
///
/// Recording a booking does not touch the car. Callers that want the car
/// marked `booked` issue a separate status transition.
#[derive(Clone)]
pub struct BookingLedger {
    repo: Arc<dyn BookingRepository>,
}

impl BookingLedger {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        car_id: &str,
        booked_by: &str,
        mut payload: Map<String, Value>,
    ) -> AppResult<Uuid> {
        if car_id.trim().is_empty() {
            return Err(AppError::Validation("carId is required".into()));
        }
        let car_id = parse_id(car_id)?;
        let booked_by = normalize_email(booked_by);
        if booked_by.is_empty() {
            return Err(AppError::Validation("bookedBy is required".into()));
        }
        for key in RESERVED_KEYS {
            payload.remove(key);
        }

        let booking = Booking {
            id: new_id(),
            car_id,
            booked_by,
            created_at: OffsetDateTime::now_utc(),
            attributes: payload,
        };
        let booking = self.repo.insert(booking).await?;
        Ok(booking.id)
    }

    pub async fn list_by_renter(&self, email: &str) -> AppResult<Vec<Booking>> {
        self.repo.find_by_renter(&normalize_email(email)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cars::repo_types::CarStatus;
    use crate::cars::services::{CarCatalog, StatusPolicy};
    use crate::memory::MemoryStore;
    use serde_json::json;

    fn ledger() -> BookingLedger {
        BookingLedger::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn booking_an_unknown_car_is_recorded() {
        let bookings = ledger();
        let car_id = new_id().to_string();
        let mut payload = Map::new();
        payload.insert("pickup".into(), json!("2026-11-01"));
        payload.insert("carId".into(), json!("ignored"));

        let id = bookings.create(&car_id, "R@X.com", payload).await.unwrap();

        let mine = bookings.list_by_renter("r@x.com").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, id);
        assert_eq!(mine[0].car_id.to_string(), car_id);
        assert_eq!(mine[0].booked_by, "r@x.com");
        assert_eq!(mine[0].attributes.len(), 1);
        assert_eq!(mine[0].attributes["pickup"], json!("2026-11-01"));
    }

    #[tokio::test]
    async fn booking_validates_inputs() {
        let bookings = ledger();
        assert!(matches!(
            bookings.create("nope", "r@x.com", Map::new()).await,
            Err(AppError::InvalidId(_))
        ));
        assert!(matches!(
            bookings.create(&new_id().to_string(), "", Map::new()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn missing_car_id_is_a_validation_error() {
        let bookings = ledger();
        for car_id in ["", "   "] {
            let err = bookings.create(car_id, "r@x.com", Map::new()).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m.contains("carId")), "{err:?}");
        }
        assert!(bookings.list_by_renter("r@x.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn renter_listing_filters_by_email() {
        let bookings = ledger();
        let car = new_id().to_string();
        bookings.create(&car, "a@x.com", Map::new()).await.unwrap();
        bookings.create(&car, "a@x.com", Map::new()).await.unwrap();
        bookings.create(&car, "b@x.com", Map::new()).await.unwrap();

        assert_eq!(bookings.list_by_renter("a@x.com").await.unwrap().len(), 2);
        assert_eq!(bookings.list_by_renter("b@x.com").await.unwrap().len(), 1);
        assert!(bookings.list_by_renter("c@x.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn booking_and_status_change_are_independent() {
        let store = Arc::new(MemoryStore::new());
        let cars = CarCatalog::new(store.clone(), StatusPolicy::Permissive);
        let bookings = BookingLedger::new(store.clone());

        let car_id = cars.create("p@x.com", Map::new()).await.unwrap().to_string();
        bookings.create(&car_id, "r@x.com", Map::new()).await.unwrap();
        assert_eq!(cars.get(&car_id).await.unwrap().status, CarStatus::Listed);

        cars.transition_status(&car_id, "booked").await.unwrap();
        cars.delete(&car_id).await.unwrap();
        assert_eq!(bookings.list_by_renter("r@x.com").await.unwrap().len(), 1);
    }
}
