//! Errors raised by the Balancer math, named after the revert reasons of the
//! vault contracts.

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("addition overflow")]
    AddOverflow,
    #[error("subtraction overflow")]
    SubOverflow,
    #[error("multiplication overflow")]
    MulOverflow,
    #[error("division by zero")]
    ZeroDivision,
    #[error("internal division error")]
    DivInternal,
    #[error("token index out of range")]
    InvalidToken,
    #[error("stable invariant didn't converge")]
    StableInvariantDidntConverge,
}

impl Error {
    /// The `BAL#` revert code the contracts use for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::AddOverflow => "BAL#000",
            Error::SubOverflow => "BAL#001",
            Error::MulOverflow => "BAL#003",
            Error::ZeroDivision => "BAL#004",
            Error::DivInternal => "BAL#005",
            Error::InvalidToken => "BAL#309",
            Error::StableInvariantDidntConverge => "BAL#321",
        }
    }
}
