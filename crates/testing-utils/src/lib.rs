//! # Fleet Testing Utils
//!
//! Shared test doubles for the fleet workspace: a scripted command runner,
//! a reachability provider and an in-memory history store, plus builders
//! for targets and results.
//!
//! ```toml
//! [dev-dependencies]
//! fleet-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
