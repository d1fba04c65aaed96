//! tests/api/main.rs

mod cache;
mod chain;
mod health_check;
mod service;
