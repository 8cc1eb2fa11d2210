//! HTTP request handlers

pub mod health;
pub mod prediction;

pub use health::{health_check, root};
pub use prediction::{list_history, predict};
