//! src/domain/weather_snapshot.rs

/// Point-in-time weather reading for one city.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    temperature: f64,
    humidity: f64,
    description: String,
}

impl WeatherSnapshot {
    pub fn new(temperature: f64, humidity: f64, description: impl Into<String>) -> Self {
        Self {
            temperature,
            humidity,
            description: description.into(),
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
