//! Wall-clock budget shared by the extraction stages.

use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// A point in time after which page-level work stops.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start a budget now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// Optional budget, as carried by the config.
    pub fn from_timeout(timeout: Option<Duration>) -> Option<Self> {
        timeout.map(Self::after)
    }

    /// Fail with [`Error::Timeout`] once the budget is spent.
    pub fn check(&self) -> Result<()> {
        if Instant::now() >= self.at {
            Err(Error::Timeout(self.budget))
        } else {
            Ok(())
        }
    }
}

/// Check an optional deadline.
pub fn check(deadline: Option<&Deadline>) -> Result<()> {
    deadline.map_or(Ok(()), Deadline::check)
}
