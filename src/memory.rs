//! In-process storage for local runs and tests.
//!
//! Mirrors the Postgres repositories: email uniqueness is checked and the
//! user inserted under one write lock, so concurrent registrations cannot
//! both succeed. Guarded status writes compare under the same lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo::UserRepository;
use crate::auth::repo_types::User;
use crate::bookings::repo::BookingRepository;
use crate::bookings::repo_types::Booking;
use crate::cars::repo::CarRepository;
use crate::cars::repo_types::{Car, CarPatch, CarStatus};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    cars: BTreeMap<Uuid, Car>,
    bookings: Vec<Booking>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(email).cloned())
    }

    async fn insert(&self, user: User) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.email) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        tables.users.insert(user.email.clone(), user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CarRepository for MemoryStore {
    async fn insert(&self, car: Car) -> AppResult<Car> {
        self.tables.write().await.cars.insert(car.id, car.clone());
        Ok(car)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Car>> {
        Ok(self.tables.read().await.cars.get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Car>> {
        Ok(self.tables.read().await.cars.values().cloned().collect())
    }

    async fn find_by_provider(&self, provider_email: &str) -> AppResult<Vec<Car>> {
        let tables = self.tables.read().await;
        Ok(tables
            .cars
            .values()
            .rev()
            .filter(|c| c.provider_email == provider_email)
            .cloned()
            .collect())
    }

    async fn find_recent(&self, limit: usize) -> AppResult<Vec<Car>> {
        let tables = self.tables.read().await;
        let mut cars: Vec<Car> = tables.cars.values().cloned().collect();
        cars.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        cars.truncate(limit);
        Ok(cars)
    }

    async fn update(&self, id: Uuid, patch: CarPatch) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.cars.get_mut(&id) {
            Some(car) if patch.applies_to(car) => {
                patch.apply(car);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_status(
        &self,
        id: Uuid,
        expected: Option<&CarStatus>,
        status: &CarStatus,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.cars.get_mut(&id) {
            Some(car) if expected.map_or(true, |e| *e == car.status) => {
                car.status = status.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.write().await.cars.remove(&id).is_some())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert(&self, booking: Booking) -> AppResult<Booking> {
        self.tables.write().await.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn find_by_renter(&self, email: &str) -> AppResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| b.booked_by == email)
            .cloned()
            .collect())
    }
}
