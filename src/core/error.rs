use std::fmt;

use thiserror::Error;

use super::types::DocumentKind;

/// A single failed rule with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dot-separated path to the invalid field (e.g. "waybill.driver.license").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// Rule identifier if applicable (e.g. "WB-07").
    pub rule: Option<String>,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "[{}] {}: {}", rule, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl FieldViolation {
    /// Create a violation without a rule ID.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Create a violation with a rule ID.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}

/// Every field that kept a draft from leaving DRAFT.
///
/// Never empty: the validator only builds one when at least one rule failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} validation failure(s): {}", .violations.len(), join(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Paths of all failing fields, in rule order.
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }

    /// Whether any violation concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from the tax calculator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TaxError {
    /// A line has a non-positive quantity or a negative price.
    #[error("invalid line item {index}: {reason}")]
    InvalidLineItem { index: usize, reason: String },

    /// The configured rate is outside `0..=1`.
    #[error("invalid tax rate {0}")]
    InvalidRate(String),

    /// Document totals exceed the range of `Decimal`.
    #[error("document amounts overflow")]
    Overflow,
}

/// Errors from series numbering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SeriesError {
    /// No counter is configured for the series. Misconfiguration, never retried.
    #[error("series {series} is not configured for {kind} documents")]
    NotFound { kind: DocumentKind, series: String },

    /// Reconfiguration would move an existing counter backwards.
    #[error("series {series} is already at {current}, refusing to reset to {requested}")]
    Regression {
        series: String,
        current: u64,
        requested: u64,
    },

    /// The counter reached `u64::MAX`.
    #[error("series {series} is exhausted")]
    Exhausted { series: String },

    /// The backing store failed.
    #[error("series storage error: {0}")]
    Storage(String),
}

impl SeriesError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
