//! Shared types and rule engines for the AgriSmart yield advisory platform
//!
//! This crate contains the domain model and the deterministic rules shared
//! between the backend and the browser (via WASM).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
