//! src/routes/mod.rs

mod cache;
mod health_check;
mod metrics;
mod weather;

pub use cache::{cache_health, cache_stats};
pub use health_check::health_check;
pub use metrics::metrics;
pub use weather::get_weather;
