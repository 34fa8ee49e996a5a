// src/config/mod.rs
pub mod app;

pub use app::{AppConfig, ANN_URL, SITE_ORIGIN};
