// Library exports for the rep coach analysis core

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::CoachConfig;
pub use error::{CoachError, Result};
