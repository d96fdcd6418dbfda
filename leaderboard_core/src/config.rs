use std::time::Duration;

use crate::error::LeaderboardError;

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    page_size: usize,
    fetch_timeout: Option<Duration>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fetch_timeout: None,
        }
    }
}

impl ViewConfig {
    pub fn new(page_size: usize) -> Result<Self, LeaderboardError> {
        if page_size == 0 {
            return Err(LeaderboardError::InvalidPageSize(page_size));
        }
        Ok(Self {
            page_size,
            ..Self::default()
        })
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Per-request limit for avatar fetches. `None` waits indefinitely.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout
    }
}
