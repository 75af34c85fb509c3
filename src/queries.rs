//! Read-only views over the catalog and the ledger.
//!
//! Sorting, limits and filters for browse screens live here so that every
//! transport gets the same answers.

use crate::bookings::repo_types::Booking;
use crate::bookings::services::BookingLedger;
use crate::cars::repo_types::Car;
use crate::cars::services::CarCatalog;
use crate::error::{AppError, AppResult};

pub const DEFAULT_FEATURED_LIMIT: i64 = 6;
pub const MAX_FEATURED_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct QueryFacade {
    cars: CarCatalog,
    bookings: BookingLedger,
}

impl QueryFacade {
    pub fn new(cars: CarCatalog, bookings: BookingLedger) -> Self {
        Self { cars, bookings }
    }

    /// Newest cars by creation time. `None` means the default of six.
    pub async fn featured_cars(&self, limit: Option<i64>) -> AppResult<Vec<Car>> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
        if limit < 1 {
            return Err(AppError::Validation("limit must be at least 1".into()));
        }
        let limit = limit.min(MAX_FEATURED_LIMIT) as usize;
        self.cars.list_featured(limit).await
    }

    pub async fn browse_cars(&self) -> AppResult<Vec<Car>> {
        self.cars.list_all().await
    }

    /// A provider's listings, newest first.
    pub async fn provider_listings(&self, provider_email: &str) -> AppResult<Vec<Car>> {
        if provider_email.trim().is_empty() {
            return Err(AppError::Validation("providerEmail is required".into()));
        }
        self.cars.list_by_provider(provider_email).await
    }

    pub async fn car(&self, id: &str) -> AppResult<Car> {
        self.cars.get(id).await
    }

    pub async fn renter_bookings(&self, email: &str) -> AppResult<Vec<Booking>> {
        if email.trim().is_empty() {
            return Err(AppError::Validation("email is required".into()));
        }
        self.bookings.list_by_renter(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::{json, Map};
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    use crate::cars::repo::CarRepository;
    use crate::cars::repo_types::CarStatus;
    use crate::cars::services::StatusPolicy;
    use crate::ids::new_id;
    use crate::memory::MemoryStore;

    fn facade(store: &Arc<MemoryStore>) -> QueryFacade {
        QueryFacade::new(
            CarCatalog::new(store.clone(), StatusPolicy::Permissive),
            BookingLedger::new(store.clone()),
        )
    }

    async fn seed(store: &MemoryStore, count: i64) -> Vec<Uuid> {
        let base = OffsetDateTime::now_utc() - Duration::days(1);
        let mut ids = Vec::new();
        // Insert out of chronological order so the sort has work to do.
        for i in (0..count).rev() {
            let car = Car {
                id: new_id(),
                provider_email: "p@x.com".into(),
                status: CarStatus::Listed,
                created_at: base + Duration::minutes(i),
                attributes: Map::new(),
            };
            let car = CarRepository::insert(store, car).await.unwrap();
            ids.push(car.id);
        }
        ids
    }

    #[tokio::test]
    async fn featured_returns_most_recent_descending() {
        let store = Arc::new(MemoryStore::new());
        // ids[0] is the newest
        let ids = seed(&store, 5).await;

        let got: Vec<Uuid> = facade(&store)
            .featured_cars(Some(3))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(got, ids[..3].to_vec());
    }

    #[tokio::test]
    async fn featured_defaults_to_six() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, 9).await;
        let got = facade(&store).featured_cars(None).await.unwrap();
        assert_eq!(got.len(), 6);
        assert!(got.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn featured_limit_bounds() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, 3).await;
        let queries = facade(&store);
        assert!(matches!(
            queries.featured_cars(Some(0)).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(queries.featured_cars(Some(1000)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn listings_and_bookings_need_an_email() {
        let store = Arc::new(MemoryStore::new());
        let queries = facade(&store);
        assert!(matches!(
            queries.provider_listings("").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            queries.renter_bookings(" ").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn provider_listings_match_case_insensitively() {
        let store = Arc::new(MemoryStore::new());
        let catalog = CarCatalog::new(store.clone(), StatusPolicy::Permissive);
        let mut body = Map::new();
        body.insert("model".into(), json!("Golf"));
        let id = catalog.create("Owner@X.com", body).await.unwrap();

        let listed = facade(&store).provider_listings("owner@x.COM").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(facade(&store).car(&id.to_string()).await.unwrap().id, id);
        assert_eq!(facade(&store).browse_cars().await.unwrap().len(), 1);
    }
}
