use std::sync::Arc;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::services::normalize_email;
use crate::cars::repo::CarRepository;
use crate::cars::repo_types::{Car, CarPatch, CarStatus};
use crate::error::{AppError, AppResult};
use crate::ids::{new_id, parse_id};

/// Payload keys owned by the catalog rather than the provider.
const ID_KEYS: [&str; 2] = ["id", "_id"];
const CREATED_AT_KEY: &str = "createdAt";
const PROVIDER_KEY: &str = "providerEmail";
const STATUS_KEY: &str = "status";

/// How strictly status changes are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Any non-empty status is accepted; an empty one is a validation error.
    #[default]
    Permissive,
    /// Only `listed -> booked` and `booked -> listed`. The write only lands if
    /// the status is still the one that was checked.
    Strict,
}

impl StatusPolicy {
    /// Prior status the write must still see, if the policy depends on it.
    fn expected_prior(self, current: &CarStatus) -> Option<CarStatus> {
        match self {
            Self::Permissive => None,
            Self::Strict => Some(current.clone()),
        }
    }
}

/// Every status change goes through here.
pub fn check_transition(policy: StatusPolicy, from: &CarStatus, to: &CarStatus) -> AppResult<()> {
    if to.as_str().is_empty() {
        return Err(AppError::Validation("status is required".into()));
    }
    let allowed = match policy {
        StatusPolicy::Permissive => true,
        StatusPolicy::Strict => matches!(
            (from, to),
            (CarStatus::Listed, CarStatus::Booked) | (CarStatus::Booked, CarStatus::Listed)
        ),
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

fn take_string(payload: &mut Map<String, Value>, key: &str) -> AppResult<Option<String>> {
    match payload.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(AppError::Validation(format!("{key} must be a string"))),
    }
}

fn strip_immutable(payload: &mut Map<String, Value>) {
    for key in ID_KEYS {
        payload.remove(key);
    }
    payload.remove(CREATED_AT_KEY);
}

/// Car listings and their availability.
#[derive(Clone)]
pub struct CarCatalog {
    repo: Arc<dyn CarRepository>,
    policy: StatusPolicy,
}

impl CarCatalog {
    pub fn new(repo: Arc<dyn CarRepository>, policy: StatusPolicy) -> Self {
        Self { repo, policy }
    }

    pub async fn create(&self, provider_email: &str, mut payload: Map<String, Value>) -> AppResult<Uuid> {
        let provider_email = normalize_email(provider_email);
        if provider_email.is_empty() {
            return Err(AppError::Validation("providerEmail is required".into()));
        }

        strip_immutable(&mut payload);
        payload.remove(PROVIDER_KEY);
        let status = match take_string(&mut payload, STATUS_KEY)? {
            None => CarStatus::Listed,
            Some(raw) => {
                let status = CarStatus::from(raw);
                if !status.is_known() {
                    return Err(AppError::Validation(format!(
                        "unknown initial status '{status}'"
                    )));
                }
                status
            }
        };

        let car = Car {
            id: new_id(),
            provider_email,
            status,
            created_at: OffsetDateTime::now_utc(),
            attributes: payload,
        };
        let car = self.repo.insert(car).await?;
        Ok(car.id)
    }

    pub async fn get(&self, id: &str) -> AppResult<Car> {
        let id = parse_id(id)?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Car not found".into()))
    }

    pub async fn list_all(&self) -> AppResult<Vec<Car>> {
        self.repo.find_all().await
    }

    pub async fn list_by_provider(&self, provider_email: &str) -> AppResult<Vec<Car>> {
        self.repo
            .find_by_provider(&normalize_email(provider_email))
            .await
    }

    pub async fn list_featured(&self, limit: usize) -> AppResult<Vec<Car>> {
        self.repo.find_recent(limit).await
    }

    /// Merge `patch` into the stored car. Identifier fields in the patch are dropped.
    pub async fn update(&self, id: &str, mut patch: Map<String, Value>) -> AppResult<()> {
        let id = parse_id(id)?;
        strip_immutable(&mut patch);

        let provider_email = take_string(&mut patch, PROVIDER_KEY)?
            .map(|e| normalize_email(&e))
            .filter(|e| !e.is_empty());
        let (status, expected_status) = match take_string(&mut patch, STATUS_KEY)? {
            None => (None, None),
            Some(raw) => {
                let to = CarStatus::from(raw);
                let current = self
                    .repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Car not found".into()))?;
                check_transition(self.policy, &current.status, &to)?;
                (Some(to), self.policy.expected_prior(&current.status))
            }
        };

        let to = status.clone();
        let patch = CarPatch {
            provider_email,
            status,
            expected_status,
            attributes: patch,
        };
        if self.repo.update(id, patch).await? {
            return Ok(());
        }
        match to {
            Some(to) => Err(self.lost_race(id, &to).await),
            None => Err(AppError::NotFound("Car not found".into())),
        }
    }

    pub async fn transition_status(&self, id: &str, new_status: &str) -> AppResult<CarStatus> {
        let id = parse_id(id)?;
        let to = CarStatus::from(new_status);
        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Car not found".into()))?;
        check_transition(self.policy, &current.status, &to)?;

        let expected = self.policy.expected_prior(&current.status);
        if self.repo.set_status(id, expected.as_ref(), &to).await? {
            Ok(to)
        } else {
            Err(self.lost_race(id, &to).await)
        }
    }

    /// A guarded status write matched no row: either the car is gone or its
    /// status changed after it was checked.
    async fn lost_race(&self, id: Uuid, to: &CarStatus) -> AppError {
        match self.repo.find_by_id(id).await {
            Ok(Some(car)) => AppError::InvalidTransition {
                from: car.status.to_string(),
                to: to.to_string(),
            },
            Ok(None) => AppError::NotFound("Car not found".into()),
            Err(e) => e,
        }
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let id = parse_id(id)?;
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Car not found".into()))
        }
    }
}
