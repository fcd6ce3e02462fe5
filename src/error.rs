use itertools::Itertools;
use sea_orm::DbErr;
use thiserror::Error;

use crate::location::{StallKey, Street};

/// A field that failed validation. Produced by [`crate::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid stall number: {0}")]
    InvalidNumber(&'static str),

    #[error(
        "Unknown street {0:?}; street name must be one of: {streets}",
        streets = Street::ALL.iter().join(", ")
    )]
    InvalidEnum(String),

    #[error("Rating must be a whole number between 1 and 5")]
    OutOfRange,

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} does not apply to Warp Hall stalls")]
    NotApplicable(&'static str),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    /// Create on a key that is already taken
    #[error("Stall number {0} already exists")]
    Conflict(StallKey),

    #[error("No stall found with number {0}")]
    NotFound(String),

    /// The store could not be reached at all
    #[error("Database connection failed: {0}")]
    StoreUnavailable(#[source] DbErr),

    /// A statement failed on an open connection
    #[error("Database error: {0}")]
    Store(#[from] DbErr),

    #[error("You don't have permission to use this command")]
    Unauthorized,
}

impl Error {
    /// Whether the failure is the caller's doing rather than the system's.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::StoreUnavailable(_) | Self::Store(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
