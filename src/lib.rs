//! src/lib.rs
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod scheduler;
pub mod startup;
pub mod subscription_client;
pub mod telemetry;
pub mod weather;
