//! src/domain/subscriber_token.rs

use crate::domain::ValidationError;

const MAX_TOKEN_LENGTH: usize = 128;

/// Opaque credential identifying a subscription in confirm and unsubscribe links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberToken(String);

impl AsRef<str> for SubscriberToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SubscriberToken {
    /// Tokens are issued by the subscription service. Anything that could not
    /// be embedded in a link path without escaping is rejected.
    pub fn parse(s: String) -> Result<SubscriberToken, ValidationError> {
        let is_empty = s.is_empty();
        let is_too_long = s.chars().count() > MAX_TOKEN_LENGTH;
        let has_forbidden_chars = s
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        if is_empty || is_too_long || has_forbidden_chars {
            Err(ValidationError::InvalidToken(s))
        } else {
            Ok(Self(s))
        }
    }
}

impl TryFrom<String> for SubscriberToken {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}
