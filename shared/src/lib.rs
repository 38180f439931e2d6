//! Shared types and models for the Papallacta forecast platform
//!
//! This crate contains the forecast data model and the pure parts of the
//! pipeline (seasonal reference table, alert classification, series
//! validation) shared between the backend and the dashboard (via WASM).

pub mod classification;
pub mod error;
pub mod models;
pub mod seasonal;
pub mod types;
pub mod validation;

pub use classification::*;
pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
