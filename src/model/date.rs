//! Date-dimension configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in a date-dimension configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DateConfigError {
    #[error("date range is inverted: start year {start} is after end year {end}")]
    InvertedRange { start: i32, end: i32 },

    #[error("UTC offset {0} hours is outside -14..=14")]
    OffsetOutOfRange(f64),
}

/// Synthetic date table settings plus the timezone used for filter
/// arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTableConfig {
    pub start_year: i32,
    pub end_year: i32,

    /// Local-calendar offset from UTC in hours. Fractional offsets
    /// (e.g. `5.5`) are kept at minute precision.
    #[serde(default)]
    pub utc_offset_hours: f64,

    /// Logical name of the table carrying the primary date field.
    pub table: String,

    /// Logical name of the primary date field.
    pub field: String,
}

impl DateTableConfig {
    pub fn new(
        start_year: i32,
        end_year: i32,
        table: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            start_year,
            end_year,
            utc_offset_hours: 0.0,
            table: table.into(),
            field: field.into(),
        }
    }

    pub fn with_utc_offset(mut self, hours: f64) -> Self {
        self.utc_offset_hours = hours;
        self
    }

    pub fn validate(&self) -> Result<(), DateConfigError> {
        if self.start_year > self.end_year {
            return Err(DateConfigError::InvertedRange {
                start: self.start_year,
                end: self.end_year,
            });
        }
        if !(-14.0..=14.0).contains(&self.utc_offset_hours) {
            return Err(DateConfigError::OffsetOutOfRange(self.utc_offset_hours));
        }
        Ok(())
    }
}
