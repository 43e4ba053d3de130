//! Error types for the reconciliation core.

use thiserror::Error;

/// Errors raised while turning wire records into executions or building the pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// A raw execution record is missing a required field or carries an unusable value.
    #[error("malformed record #{index}: field `{field}` {detail}")]
    MalformedRecord {
        index: usize,
        field: &'static str,
        detail: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A sum, difference or quotient left the range of `Decimal`.
    #[error("decimal overflow in {0}")]
    Overflow(&'static str),
}

impl LedgerError {
    pub fn missing(index: usize, field: &'static str) -> Self {
        Self::MalformedRecord {
            index,
            field,
            detail: "is missing".to_string(),
        }
    }

    pub fn invalid(index: usize, field: &'static str, value: impl std::fmt::Display) -> Self {
        Self::MalformedRecord {
            index,
            field,
            detail: format!("has unusable value `{}`", value),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_message() {
        let err = LedgerError::missing(3, "comission");
        assert_eq!(err.to_string(), "malformed record #3: field `comission` is missing");

        let err = LedgerError::invalid(0, "buysell", "X");
        assert_eq!(
            err.to_string(),
            "malformed record #0: field `buysell` has unusable value `X`"
        );
    }

    #[test]
    fn test_overflow_message() {
        let err = LedgerError::Overflow("gross profit");
        assert_eq!(err.to_string(), "decimal overflow in gross profit");
    }
}
