//! tcforge-core — I/O format engine, test case model, and scoring contracts.
//!
//! This crate defines how a test file is described (an ordered sequence of
//! segments over named variables), how such a description is printed, and the
//! traits the runner implements to execute solutions and score their output.

pub mod error;
pub mod format;
pub mod parser;
pub mod printer;
pub mod problem;
pub mod progress;
pub mod report;
pub mod results;
pub mod scoring;
pub mod testcase;
pub mod traits;
pub mod variable;
