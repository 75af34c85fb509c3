use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Availability of a car. `Other` holds values outside the two-state
/// machine, which the permissive policy lets through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CarStatus {
    #[default]
    Listed,
    Booked,
    Other(String),
}

impl CarStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Listed => "listed",
            Self::Booked => "booked",
            Self::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for CarStatus {
    fn from(raw: &str) -> Self {
        match raw.trim() {
            "listed" => Self::Listed,
            "booked" => Self::Booked,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for CarStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CarStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CarStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// A listing. `attributes` is the provider's payload (make, model, price, ...),
/// kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Uuid,
    pub provider_email: String,
    pub status: CarStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Fields an update may overwrite. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarPatch {
    pub provider_email: Option<String>,
    pub status: Option<CarStatus>,
    /// When set, the patch only applies while the stored status still equals it.
    pub expected_status: Option<CarStatus>,
    pub attributes: Map<String, Value>,
}

impl CarPatch {
    pub fn applies_to(&self, car: &Car) -> bool {
        self.expected_status
            .as_ref()
            .map_or(true, |expected| *expected == car.status)
    }

    pub fn apply(self, car: &mut Car) {
        if let Some(email) = self.provider_email {
            car.provider_email = email;
        }
        if let Some(status) = self.status {
            car.status = status;
        }
        car.attributes.extend(self.attributes);
    }
}

#[derive(Debug, FromRow)]
pub struct CarRow {
    pub id: Uuid,
    pub provider_email: String,
    pub status: String,
    pub attributes: Json<Map<String, Value>>,
    pub created_at: OffsetDateTime,
}

impl From<CarRow> for Car {
    fn from(r: CarRow) -> Self {
        Self {
            id: r.id,
            provider_email: r.provider_email,
            status: CarStatus::from(r.status),
            created_at: r.created_at,
            attributes: r.attributes.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parses_known_and_unknown_values() {
        assert_eq!(CarStatus::from("listed"), CarStatus::Listed);
        assert_eq!(CarStatus::from(" booked "), CarStatus::Booked);
        assert_eq!(
            CarStatus::from("maintenance"),
            CarStatus::Other("maintenance".into())
        );
        assert!(!CarStatus::from("maintenance").is_known());
        assert_eq!(CarStatus::default(), CarStatus::Listed);
    }

    #[test]
    fn car_serializes_flat_in_camel_case() {
        let mut attributes = Map::new();
        attributes.insert("model".into(), json!("Civic"));
        let car = Car {
            id: Uuid::nil(),
            provider_email: "p@x.com".into(),
            status: CarStatus::Booked,
            created_at: OffsetDateTime::UNIX_EPOCH,
            attributes,
        };
        let value = serde_json::to_value(&car).unwrap();
        assert_eq!(value["providerEmail"], "p@x.com");
        assert_eq!(value["status"], "booked");
        assert_eq!(value["model"], "Civic");
        assert_eq!(value["createdAt"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn patch_merges_instead_of_replacing() {
        let mut attributes = Map::new();
        attributes.insert("model".into(), json!("Civic"));
        attributes.insert("price".into(), json!(40));
        let mut car = Car {
            id: Uuid::nil(),
            provider_email: "p@x.com".into(),
            status: CarStatus::Listed,
            created_at: OffsetDateTime::UNIX_EPOCH,
            attributes,
        };

        let mut changes = Map::new();
        changes.insert("price".into(), json!(55));
        CarPatch {
            attributes: changes,
            ..CarPatch::default()
        }
        .apply(&mut car);

        assert_eq!(car.attributes["price"], json!(55));
        assert_eq!(car.attributes["model"], json!("Civic"));
        assert_eq!(car.status, CarStatus::Listed);
    }

    #[test]
    fn patch_guard_compares_stored_status() {
        let car = Car {
            id: Uuid::nil(),
            provider_email: "p@x.com".into(),
            status: CarStatus::Booked,
            created_at: OffsetDateTime::UNIX_EPOCH,
            attributes: Map::new(),
        };
        assert!(CarPatch::default().applies_to(&car));

        let stale = CarPatch {
            expected_status: Some(CarStatus::Listed),
            ..CarPatch::default()
        };
        assert!(!stale.applies_to(&car));

        let current = CarPatch {
            expected_status: Some(CarStatus::Booked),
            ..CarPatch::default()
        };
        assert!(current.applies_to(&car));
    }
}
