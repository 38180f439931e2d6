//! Errors raised by the pure forecast helpers

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Unknown forecast period: {0}")]
    UnknownPeriod(String),

    #[error("Horizon dates out of range for generation date {0}")]
    DateOutOfRange(NaiveDate),

    #[error("Series is empty")]
    EmptySeries,

    #[error("Series dates are not consecutive at index {index}")]
    NonContiguous { index: usize },

    #[error("Series dates do not strictly increase at index {index}")]
    Unordered { index: usize },

    #[error("Non-finite precipitation at index {index}")]
    NonFiniteValue { index: usize },
}
