//! Accident details

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// What happened, where and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AccidentDetails {
    /// When the accident happened
    pub timestamp: DateTime<Utc>,
    /// Where it happened
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub location: String,
    /// Free-text account of the accident
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub description: String,
    /// Ordered circumstance tags ticked on the form (e.g. "rear_collision")
    #[validate(length(min = 1, message = "at least one circumstance is required"))]
    pub circumstances: Vec<String>,
    /// Visible damage to the vehicles
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub damage_description: String,
}
