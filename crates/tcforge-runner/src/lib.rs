//! tcforge-runner — runs solutions and checkers on the local machine.
//!
//! Provides the local [`OperatingSystem`](tcforge_core::traits::OperatingSystem),
//! the external checker scorer, and the two pipelines built on them: the
//! [`Generator`](generator::Generator) writes test files, the
//! [`Evaluator`](evaluator::Evaluator) grades a solution against them.

pub mod checker;
pub mod config;
pub mod evaluator;
pub mod generator;
pub mod os;

pub use checker::CustomScorer;
pub use config::{create_scorer, load_config_from, RunnerConfig, ScorerConfig};
pub use evaluator::{Evaluator, EvaluatorConfig};
pub use generator::{GenerationSummary, Generator, GeneratorConfig};
pub use os::LocalOperatingSystem;
