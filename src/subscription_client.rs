//! src/subscription_client.rs

use crate::domain::{Frequency, Subscription};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("failed to reach the subscription service")]
    Request(#[source] reqwest::Error),
    #[error("subscription service answered with status {0}")]
    UnexpectedStatus(u16),
    #[error("failed to decode the subscription list")]
    Decode(#[source] reqwest::Error),
}

/// Read access to confirmed subscriptions.
#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    async fn get_confirmed(&self, frequency: Frequency) -> Result<Vec<Subscription>, ClientError>;
}

pub struct SubscriptionClient {
    http_client: Client,
    base_url: String,
}

impl SubscriptionClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, anyhow::Error> {
        use anyhow::Context;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build http client for subscription service.")?;
        Ok(Self {
            http_client,
            base_url,
        })
    }
}

#[async_trait]
impl SubscriptionProvider for SubscriptionClient {
    #[tracing::instrument(name = "Fetch confirmed subscriptions", skip(self))]
    async fn get_confirmed(&self, frequency: Frequency) -> Result<Vec<Subscription>, ClientError> {
        let url = format!("{}/subscriptions/confirmed", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("frequency", frequency.as_str())])
            .send()
            .await
            .map_err(ClientError::Request)?;
        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus(response.status().as_u16()));
        }
        response
            .json::<Vec<Subscription>>()
            .await
            .map_err(ClientError::Decode)
    }
}
