use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use driftbench::domain::{
    Concurrency, LoopSpec, PartialEvalPolicy, PromptSet, RubricSelection, RunContext,
};
use driftbench::retry::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub experiment: ExperimentConfig,
    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,
    pub prompts: PromptSet,
    pub retry: RetryConfig,
    pub evaluation: EvaluationConfig,
    pub concurrency: Concurrency,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub name: String,
    /// Directory scanned for seed files
    pub input_dir: PathBuf,
    /// Output directory template; `{{experiment_name}}` is substituted
    pub output_dir: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "drift-experiment".to_string(),
            input_dir: PathBuf::from("inputs"),
            output_dir: "results/{{experiment_name}}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Modality pattern, e.g. "I-T-I" or "T-I-T"
    pub pattern: String,
    pub iterations: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            pattern: "I-T-I".to_string(),
            iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub transform: RetryPolicy,
    pub evaluation: RetryPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            transform: RetryPolicy::default(),
            evaluation: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Judge model passed to the Gemini evaluator
    pub model: String,
    pub rubrics: RubricSelection,
    pub partial: PartialEvalPolicy,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-lite".to_string(),
            rubrics: RubricSelection::default(),
            partial: PartialEvalPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Copy the loaded config into the run directory
    pub save_config_snapshot: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            save_config_snapshot: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            experiment: ExperimentConfig::default(),
            loop_config: LoopConfig::default(),
            prompts: PromptSet::default(),
            retry: RetryConfig::default(),
            evaluation: EvaluationConfig::default(),
            concurrency: Concurrency::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir
                .join(project_name)
                .join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!(
                            "Failed to load config from {}: {}",
                            primary_config.display(),
                            e
                        );
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!(
                        "Failed to load config from {}: {}",
                        fallback_config.display(),
                        e
                    );
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Output directory with `{{experiment_name}}` rendered
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(
            self.experiment
                .output_dir
                .replace("{{experiment_name}}", &self.experiment.name),
        )
    }

    /// Build the immutable core context from this configuration
    pub fn run_context(&self) -> Result<RunContext> {
        let spec = LoopSpec::parse(&self.loop_config.pattern, self.loop_config.iterations)
            .context("Invalid loop configuration")?;
        Ok(RunContext {
            spec,
            prompts: self.prompts.clone(),
            transform_retry: self.retry.transform,
            eval_retry: self.retry.evaluation,
            rubrics: self.evaluation.rubrics.clone(),
            partial_eval: self.evaluation.partial,
            concurrency: self.concurrency,
        })
    }
}
