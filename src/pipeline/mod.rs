//! Pipeline entry points for harvester operations.
//!
//! - `run_harvest`: List, resolve and store new auctions
//! - `run_delivery`: Send auctions through a message sink in batches
//! - `run_pipeline`: Both, plus auctions left pending by earlier runs

pub mod circuit_breaker;
pub mod harvest;
pub mod run;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerResult};
pub use harvest::{Harvester, KnownIds};
pub use run::{run_delivery, run_harvest, run_pipeline};
