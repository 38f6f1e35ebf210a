//! Typed errors for the tabulation pipeline.
//!
//! Core stages fail fast with these; a bad record must abort the run rather
//! than be coerced into a default category, which would corrupt the counts
//! undetectably. The binary wraps them in `anyhow` at the boundary.

use thiserror::Error;

/// Errors raised while validating and recoding raw household records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// TEN code outside the known 1–4 domain.
    #[error("household {serialno}: unrecognized tenure code {code}")]
    UnknownTenureCode { serialno: String, code: i64 },

    /// Raw VEH value below zero.
    #[error("household {serialno}: negative vehicle count {count}")]
    NegativeVehicleCount { serialno: String, count: i64 },

    /// A source cell that could not be parsed into its field's type.
    #[error("household {serialno}: malformed {field} value {value:?}")]
    MalformedField {
        serialno: String,
        field: &'static str,
        value: String,
    },

    /// Repeated person rows for one household disagree on household-level
    /// fields, which the source contract says cannot happen.
    #[error("household {serialno}: duplicate rows disagree on household-level fields")]
    DuplicateFieldMismatch { serialno: String },
}

/// Errors raised while pivoting aggregated cells into wide rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TabulationError {
    /// A grouping key with no weight behind it. Unreachable when the cells
    /// come from the aggregator, since keys only exist for observed records.
    #[error("zero weighted total for group {key}")]
    ZeroTotal { key: String },
}
