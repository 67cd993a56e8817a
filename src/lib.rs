//! Ladle: recipe runner for polyglot build-then-test pipelines.
//!
//! Parameterized recipes, a prerequisite DAG resolved depth-first, and
//! fail-fast sequential execution with inherited stdio.

pub mod cli;
pub mod core;
pub mod error;
pub mod transport;

pub use error::{Error, Result};
