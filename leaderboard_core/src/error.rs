use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeaderboardError {
    #[error("duplicate record id `{id}` (positions {first} and {second})")]
    DuplicateId {
        id: String,
        first: usize,
        second: usize,
    },

    #[error("page size must be at least 1 (got {0})")]
    InvalidPageSize(usize),
}

impl LeaderboardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateId { .. } | Self::InvalidPageSize(_) => ErrorKind::InvalidInput,
        }
    }
}
