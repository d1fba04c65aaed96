//! src/domain/subscription.rs

use crate::domain::Frequency;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A subscription as handed out by the subscription service.
///
/// Email and token are kept as raw strings: they are validated right before
/// a delivery is attempted, so one bad record only affects its own delivery.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: Uuid,
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub confirmed: bool,
    pub token: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
}
