use {
    crate::{pools::PoolType, swap},
    alloy::primitives::{Address, B256},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors aborting a price impact computation or a batch composition. No
/// partial result is ever returned alongside one of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("input length mismatch: expected {expected} items, got {actual}")]
    InputLengthMismatch { expected: usize, actual: usize },
    #[error("pool {0} not found")]
    PoolNotFound(B256),
    #[error("no linear pool found for wrapped token {0}")]
    LinearPoolNotFound(Address),
    #[error("token {0} not found in any known pool")]
    TokenNotFound(Address),
    #[error("division by zero")]
    DivisionByZero,
    #[error("unsupported pool type {0:?}")]
    UnsupportedPoolType(PoolType),
    #[error("pool {0} has no amplification parameter")]
    MissingAmplificationParameter(B256),
    #[error("token {0} is both a direct and a nested join token")]
    AmbiguousJoinToken(Address),
    #[error("swap returns zero")]
    SwapZeroReturnAmount,
    #[error(transparent)]
    Math(#[from] swap::Error),
    #[error(transparent)]
    Router(anyhow::Error),
}
