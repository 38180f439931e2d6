//! Domain models for the Papallacta forecast platform

mod alert;
mod forecast;
mod snapshot;

pub use alert::*;
pub use forecast::*;
pub use snapshot::*;
