//! Error types for reserve lookups, conversions and valuation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("not lendable: {0}")]
    NotLendable(String),

    #[error("not redeemable: {0}")]
    NotRedeemable(String),

    #[error("not convertible: {input} into {output}")]
    NotConvertible { input: String, output: String },

    #[error("asset {asset} does not belong to reserve {reserve}")]
    MismatchedReserve { asset: String, reserve: String },

    #[error("reserve {0} has a zero oracle price")]
    ZeroPrice(String),

    #[error("invalid reserve {reserve}: {reason}")]
    InvalidReserve { reserve: String, reason: String },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("cannot parse '{input}': {reason}")]
    Parse { input: String, reason: String },
}

impl Error {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub(crate) fn parse(input: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
