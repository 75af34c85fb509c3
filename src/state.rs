use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::repo::{PgUserRepository, UserRepository};
use crate::auth::services::UserRegistry;
use crate::bookings::repo::{BookingRepository, PgBookingRepository};
use crate::bookings::services::BookingLedger;
use crate::cars::repo::{CarRepository, PgCarRepository};
use crate::cars::services::CarCatalog;
use crate::config::AppConfig;
use crate::memory::MemoryStore;
use crate::queries::QueryFacade;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserRegistry,
    pub cars: CarCatalog,
    pub bookings: BookingLedger,
    pub queries: QueryFacade,
}

impl AppState {
    pub fn from_repos(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepository>,
        cars: Arc<dyn CarRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        let users = UserRegistry::new(users);
        let cars = CarCatalog::new(cars, config.status_policy);
        let bookings = BookingLedger::new(bookings);
        let queries = QueryFacade::new(cars.clone(), bookings.clone());
        Self {
            config,
            users,
            cars,
            bookings,
            queries,
        }
    }

    /// Postgres-backed state sharing one pool.
    pub fn postgres(config: Arc<AppConfig>, db: PgPool) -> Self {
        Self::from_repos(
            config,
            Arc::new(PgUserRepository::new(db.clone())),
            Arc::new(PgCarRepository::new(db.clone())),
            Arc::new(PgBookingRepository::new(db)),
        )
    }

    pub fn memory(config: Arc<AppConfig>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::from_repos(config, store.clone(), store.clone(), store)
    }

    pub fn in_memory() -> Self {
        Self::memory(Arc::new(AppConfig::in_memory()))
    }
}
