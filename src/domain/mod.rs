//! src/domain/mod.rs

mod frequency;
mod subscriber_email;
mod subscriber_token;
mod subscription;
mod weather_snapshot;

pub use frequency::Frequency;
pub use subscriber_email::SubscriberEmail;
pub use subscriber_token::SubscriberToken;
pub use subscription::Subscription;
pub use weather_snapshot::WeatherSnapshot;

/// Validation error for domain data
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`{0}` is not a valid subscriber email.")]
    InvalidEmail(String),
    #[error("`{0}` is not a valid subscription token.")]
    InvalidToken(String),
    #[error("`{0}` is not a valid notification frequency.")]
    InvalidFrequency(String),
}
