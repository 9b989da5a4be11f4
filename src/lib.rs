//! Set-associative TLB simulator driven by a locality-biased synthetic trace.

pub mod compare;
pub mod config;
pub mod error;
pub mod progress;
pub mod report;
pub mod rng;
pub mod sim;
pub mod tlb;
pub mod trace;

pub use error::{ConfigError, SimError};
pub use sim::{run_simulation, SimParams, SimResult};
pub use trace::{generate_trace, TraceRef};
