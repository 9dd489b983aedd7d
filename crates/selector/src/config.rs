use crate::{
    constants::{
        DEFAULT_CAP, DEFAULT_K, DEFAULT_MATRIX_PATH, DEFAULT_QUALITY_THRESHOLD,
        DEFAULT_REPORT_FILE, ENV_OUTPUT_DIR,
    },
    engine::{SolveOptions, Strategy},
    error::{Result, SelectError},
    export::ReportFormat,
    model::Settings,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    env,
    path::{Path, PathBuf},
};

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub selector: SelectorConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub cap: u64,
    pub k: usize,
    pub quality_threshold: Option<u64>,
    pub strategy: Strategy, // "reduction" | "branch-and-bound" | "milp"
    pub parallel: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            cap: DEFAULT_CAP,
            k: DEFAULT_K,
            quality_threshold: Some(DEFAULT_QUALITY_THRESHOLD),
            strategy: Strategy::default(),
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub matrix: PathBuf,
    /// Restrict the catalog to these sites; all sites when absent
    pub enabled_sites: Option<Vec<String>>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            matrix: PathBuf::from(DEFAULT_MATRIX_PATH),
            enabled_sites: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Current directory when absent
    pub dir: Option<PathBuf>,
    pub file_name: String,
    pub format: ReportFormat, // "csv" | "json"
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_name: DEFAULT_REPORT_FILE.to_string(),
            format: ReportFormat::default(),
        }
    }
}

impl Config {
    /// Loads a TOML configuration file.
    ///
    /// Range checks are left to [`Config::validate`], which callers run once
    /// every override has been applied.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SelectError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            SelectError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(config)
    }

    /// Applies `SELECTOR_OUTPUT_DIR` on top of the file settings
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(output_dir) = env::var(ENV_OUTPUT_DIR) {
            if !output_dir.trim().is_empty() {
                let path = PathBuf::from(output_dir);

                // If the path already exists but is not a directory, reject early.
                if path.exists() && !path.is_dir() {
                    return Err(SelectError::InvalidConfiguration(format!(
                        "Output path is not a directory: {}",
                        path.display()
                    )));
                }

                self.output.dir = Some(path);
            }
        }
        Ok(())
    }

    /// Range checks that do not need the latency matrix
    pub fn validate(&self) -> Result<()> {
        let selector = &self.selector;
        if selector.cap == 0 {
            return Err(SelectError::Config("cap must be greater than 0".to_string()));
        }
        if selector.k == 0 {
            return Err(SelectError::Config("k must be at least 1".to_string()));
        }
        if selector.parallel && selector.strategy != Strategy::BranchAndBound {
            log::warn!(
                "parallel = true only affects branch-and-bound, strategy is {}",
                selector.strategy
            );
        }

        if let Some(enabled) = &self.input.enabled_sites {
            let mut seen = HashSet::new();
            if let Some(dup) = enabled.iter().find(|s| !seen.insert(s.as_str())) {
                return Err(SelectError::Config(format!(
                    "enabled_sites lists '{}' twice",
                    dup
                )));
            }
            if enabled.len() < selector.k {
                return Err(SelectError::Config(format!(
                    "enabled_sites has {} entries, fewer than k = {}",
                    enabled.len(),
                    selector.k
                )));
            }
        }

        if self.output.file_name.trim().is_empty() {
            return Err(SelectError::Config(
                "output.file_name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn settings(&self) -> Settings {
        Settings {
            cap: self.selector.cap,
            k: self.selector.k,
            quality_threshold: self.selector.quality_threshold,
        }
    }

    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            strategy: self.selector.strategy,
            parallel: self.selector.parallel,
        }
    }
}
