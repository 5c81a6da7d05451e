//! End-to-end test support for revise
//!
//! - `harness`: isolated databases with seeding helpers
//! - `mocks`: fixture records and ready-made scenarios

pub mod harness;
pub mod mocks;
