//! Runner configuration and scorer factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tcforge_core::scoring::{DiffMode, DiffScorer};
use tcforge_core::traits::{OperatingSystem, Scorer};

use crate::checker::CustomScorer;
use crate::evaluator::EvaluatorConfig;
use crate::generator::GeneratorConfig;

/// Config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "tcforge.toml";

/// How outputs are scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScorerConfig {
    /// In-process comparison with the reference output.
    Diff {
        #[serde(default)]
        mode: DiffMode,
    },
    /// An external checker program.
    Custom { command: String },
}

impl Default for ScorerConfig {
    fn default() -> Self {
        ScorerConfig::Diff {
            mode: DiffMode::default(),
        }
    }
}

/// Top-level tcforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Where generated test files live.
    #[serde(default = "default_tc_dir")]
    pub tc_dir: PathBuf,
    /// Scratch directory for candidate outputs; reset on every grading run.
    #[serde(default = "default_eval_dir")]
    pub eval_dir: PathBuf,
    /// Command producing expected outputs for test cases without written ones.
    #[serde(default)]
    pub reference_solution: Option<String>,
    /// Stop grading at the first infrastructural failure.
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default)]
    pub scorer: ScorerConfig,
}

fn default_tc_dir() -> PathBuf {
    PathBuf::from("tc")
}
fn default_eval_dir() -> PathBuf {
    PathBuf::from(".tcforge/eval")
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tc_dir: default_tc_dir(),
            eval_dir: default_eval_dir(),
            reference_solution: None,
            fail_fast: false,
            scorer: ScorerConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            tc_dir: self.tc_dir.clone(),
            eval_dir: self.eval_dir.clone(),
            fail_fast: self.fail_fast,
        }
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            tc_dir: self.tc_dir.clone(),
            reference_solution: self.reference_solution.clone(),
        }
    }

    /// Reject directory layouts where resetting `eval_dir` would delete test files.
    pub fn validate(&self) -> Result<()> {
        self.evaluator_config().validate()
    }
}

/// Load config from an explicit path, or `tcforge.toml` in the current
/// directory, or defaults if neither exists.
///
/// An explicit path must exist. Commands are kept verbatim; the shell running
/// them expands any `${VAR}` references.
pub fn load_config_from(path: Option<&Path>) -> Result<RunnerConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.exists().then_some(local)
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<RunnerConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => RunnerConfig::default(),
    };

    config.validate()?;
    Ok(config)
}

/// Create a scorer from its configuration.
///
/// External checkers write their detail output into `work_dir`.
pub fn create_scorer(
    config: &ScorerConfig,
    os: Arc<dyn OperatingSystem>,
    work_dir: &Path,
) -> Arc<dyn Scorer> {
    match config {
        ScorerConfig::Diff { mode } => Arc::new(DiffScorer::new(*mode)),
        ScorerConfig::Custom { command } => Arc::new(CustomScorer::new(os, command, work_dir)),
    }
}
