//! Batch command dispatch
//!
//! Runs one command across many targets: pre-flight reachability checks,
//! a bounded worker pool, a per-target retry loop around submit-and-poll,
//! and an optional manual re-drive of the failures.

pub mod executor;
pub mod poller;
pub mod redrive;
pub mod report;
pub mod retry;
pub mod validation;
pub mod worker;

pub use executor::BatchExecutor;
pub use poller::{InvocationPoller, PollOutcome, PollSettings};
pub use redrive::{NeverRedrive, RedriveDecider, RedriveUpTo};
pub use report::{BatchReport, BatchSummary};
pub use retry::RetryPolicy;
pub use validation::TargetValidator;
pub use worker::{AttemptOutcome, TargetWorker};
