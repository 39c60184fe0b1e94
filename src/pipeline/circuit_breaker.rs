//! Circuit breaker for harvest runs.
//!
//! Individual record failures are tolerated, but a run whose listing came back
//! empty, or in which every dispatched record failed, points at a source-side
//! outage or a markup change. Such runs are aborted instead of being reported
//! as a successful harvest of nothing.

use crate::error::{AppError, Result};
use crate::models::HarvestOutcome;

/// Circuit breaker for harvest results.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker;

/// Result of circuit breaker check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitBreakerResult {
    /// Safe to keep the harvested records
    Safe { resolved: usize, failed: usize },
    /// Every listed id was already known; nothing was dispatched
    NothingNew { listed: usize },
    /// The listing yielded no identifiers at all
    EmptyListing,
    /// Every dispatched resolution failed
    AllFailed { attempted: usize },
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Classify a finished harvest.
    pub fn check(&self, outcome: &HarvestOutcome) -> CircuitBreakerResult {
        if outcome.listed == 0 {
            return CircuitBreakerResult::EmptyListing;
        }

        if outcome.dispatched == 0 {
            return CircuitBreakerResult::NothingNew {
                listed: outcome.listed,
            };
        }

        if outcome.failed == outcome.dispatched {
            return CircuitBreakerResult::AllFailed {
                attempted: outcome.dispatched,
            };
        }

        CircuitBreakerResult::Safe {
            resolved: outcome.auctions.len(),
            failed: outcome.failed,
        }
    }

    /// Validate and return Ok if safe, Err if the breaker tripped.
    pub fn validate(&self, outcome: &HarvestOutcome) -> Result<()> {
        match self.check(outcome) {
            CircuitBreakerResult::Safe { resolved, failed } => {
                log::info!(
                    "Circuit breaker: SAFE ({} auctions loaded, {} failed)",
                    resolved,
                    failed
                );
                Ok(())
            }
            CircuitBreakerResult::NothingNew { listed } => {
                log::info!(
                    "Circuit breaker: NOTHING NEW ({} listed, all already known)",
                    listed
                );
                Ok(())
            }
            CircuitBreakerResult::EmptyListing => {
                log::error!("Circuit breaker: EMPTY LISTING - aborting harvest");
                Err(AppError::EmptyListing)
            }
            CircuitBreakerResult::AllFailed { attempted } => {
                log::error!(
                    "Circuit breaker: TRIGGERED! all {} auctions failed to load",
                    attempted
                );
                Err(AppError::AllRecordsFailed { attempted })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Auction, AuctionStatus};

    fn outcome(listed: usize, dispatched: usize, failed: usize) -> HarvestOutcome {
        HarvestOutcome {
            auctions: (0..dispatched - failed)
                .map(|i| Auction::new(format!("SUB-{i}"), AuctionStatus::Active))
                .collect(),
            listed,
            dispatched,
            failed,
            listing_error: None,
        }
    }

    #[test]
    fn test_safe_with_some_failures() {
        let cb = CircuitBreaker::new();
        assert_eq!(
            cb.check(&outcome(10, 10, 9)),
            CircuitBreakerResult::Safe {
                resolved: 1,
                failed: 9
            }
        );
    }

    #[test]
    fn test_empty_listing() {
        let cb = CircuitBreaker::new();
        assert_eq!(cb.check(&outcome(0, 0, 0)), CircuitBreakerResult::EmptyListing);
        assert!(matches!(
            cb.validate(&outcome(0, 0, 0)),
            Err(AppError::EmptyListing)
        ));
    }

    #[test]
    fn test_all_failed() {
        let cb = CircuitBreaker::new();
        assert!(matches!(
            cb.validate(&outcome(5, 3, 3)),
            Err(AppError::AllRecordsFailed { attempted: 3 })
        ));
    }

    #[test]
    fn test_everything_already_known_is_safe() {
        let cb = CircuitBreaker::new();
        assert_eq!(
            cb.check(&outcome(500, 0, 0)),
            CircuitBreakerResult::NothingNew { listed: 500 }
        );
        assert!(cb.validate(&outcome(500, 0, 0)).is_ok());
    }
}
