//! src/email_client.rs

use crate::domain::{SubscriberEmail, SubscriberToken, WeatherSnapshot};
use anyhow::Context;
use askama::Template;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

/// Outgoing notifications to subscribers.
#[async_trait]
pub trait MailerProvider: Send + Sync {
    async fn send_weather_email(
        &self,
        recipient: &SubscriberEmail,
        city: &str,
        snapshot: &WeatherSnapshot,
        token: &SubscriberToken,
    ) -> Result<(), anyhow::Error>;

    async fn send_confirmation_email(
        &self,
        recipient: &SubscriberEmail,
        token: &SubscriberToken,
    ) -> Result<(), anyhow::Error>;
}

#[derive(Template)]
#[template(path = "weather_email.html")]
struct WeatherEmailHtml<'a> {
    city: &'a str,
    description: &'a str,
    temperature: f64,
    humidity: f64,
    unsubscribe_link: &'a str,
}

#[derive(Template)]
#[template(path = "weather_email.txt")]
struct WeatherEmailText<'a> {
    city: &'a str,
    description: &'a str,
    temperature: f64,
    humidity: f64,
    unsubscribe_link: &'a str,
}

#[derive(Template)]
#[template(path = "confirmation_email.html")]
struct ConfirmationEmailHtml<'a> {
    confirmation_link: &'a str,
}

#[derive(Template)]
#[template(path = "confirmation_email.txt")]
struct ConfirmationEmailText<'a> {
    confirmation_link: &'a str,
}

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    authorization_token: Secret<String>,
    app_base_url: String,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        authorization_token: Secret<String>,
        timeout: Duration,
        app_base_url: String,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build http client for email API.")?;
        Ok(Self {
            http_client,
            base_url,
            sender,
            authorization_token,
            app_base_url,
        })
    }

    pub fn unsubscribe_link(&self, token: &SubscriberToken) -> String {
        format!("{}/api/unsubscribe/{}", self.app_base_url, token.as_ref())
    }

    pub fn confirmation_link(&self, token: &SubscriberToken) -> String {
        format!("{}/api/confirm/{}", self.app_base_url, token.as_ref())
    }

    #[tracing::instrument(name = "Send email", skip(self, html_content, text_content))]
    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error> {
        let url = format!("{}/email", self.base_url);
        let request_body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: recipient.as_ref(),
            subject,
            html_body: html_content,
            text_body: text_content,
        };
        self.http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await
            .context("Failed to reach the email API.")?
            .error_for_status()
            .context("Email API rejected the request.")?;
        Ok(())
    }
}

#[async_trait]
impl MailerProvider for EmailClient {
    #[tracing::instrument(name = "Send weather email", skip(self, snapshot, token))]
    async fn send_weather_email(
        &self,
        recipient: &SubscriberEmail,
        city: &str,
        snapshot: &WeatherSnapshot,
        token: &SubscriberToken,
    ) -> Result<(), anyhow::Error> {
        let unsubscribe_link = self.unsubscribe_link(token);
        let html_body = WeatherEmailHtml {
            city,
            description: snapshot.description(),
            temperature: snapshot.temperature(),
            humidity: snapshot.humidity(),
            unsubscribe_link: &unsubscribe_link,
        }
        .render()
        .context("Failed to render weather email.")?;
        let text_body = WeatherEmailText {
            city,
            description: snapshot.description(),
            temperature: snapshot.temperature(),
            humidity: snapshot.humidity(),
            unsubscribe_link: &unsubscribe_link,
        }
        .render()
        .context("Failed to render weather email.")?;
        let subject = format!("Weather Update for {}", city);
        self.send_email(recipient, &subject, &html_body, &text_body)
            .await
    }

    #[tracing::instrument(name = "Send confirmation email", skip(self, token))]
    async fn send_confirmation_email(
        &self,
        recipient: &SubscriberEmail,
        token: &SubscriberToken,
    ) -> Result<(), anyhow::Error> {
        let confirmation_link = self.confirmation_link(token);
        let html_body = ConfirmationEmailHtml {
            confirmation_link: &confirmation_link,
        }
        .render()
        .context("Failed to render confirmation email.")?;
        let text_body = ConfirmationEmailText {
            confirmation_link: &confirmation_link,
        }
        .render()
        .context("Failed to render confirmation email.")?;
        self.send_email(
            recipient,
            "Confirm your subscription",
            &html_body,
            &text_body,
        )
        .await
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}
