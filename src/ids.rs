use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// New time-ordered id. Later calls in this process always sort after earlier ones.
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}

/// Validate an identifier received at the boundary.
pub fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidId(raw.to_string()))
}
