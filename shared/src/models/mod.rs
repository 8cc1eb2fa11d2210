//! Domain models for the AgriSmart yield advisory platform

mod food_security;
mod planting;
mod prediction;
mod ranking;
mod risk;

pub use food_security::*;
pub use planting::*;
pub use prediction::*;
pub use ranking::*;
pub use risk::*;
