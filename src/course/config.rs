use crate::error::{GitsumError, Result};
use crate::model::AnalysisOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything one batch run over a course roster needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseConfig {
    /// Directory receiving one subdirectory per student.
    pub output_dir: PathBuf,
    /// CSV with a student identifier column and a repository column.
    pub roster: PathBuf,
    /// Script run inside each clone.
    pub script_name: String,
    #[serde(default = "default_student_column")]
    pub student_column: String,
    #[serde(default = "default_repo_column")]
    pub repo_column: String,
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_true")]
    pub recalc_summaries: bool,
    #[serde(default = "default_true")]
    pub run_new_only: bool,
    /// Repository references containing any of these are rejected (template repos, placeholder ids).
    #[serde(default)]
    pub invalid_markers: Vec<String>,
    #[serde(default = "default_timeout")]
    pub script_timeout: String,
    #[serde(default = "default_report_file")]
    pub report_file: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default = "default_timings_file")]
    pub timings_file: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default = "default_ceiling")]
    pub velocity_ceiling: String,
    #[serde(default = "default_true")]
    pub detail: bool,
}

fn default_student_column() -> String {
    "Student ID".to_string()
}

fn default_repo_column() -> String {
    "Link".to_string()
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> String {
    "10m".to_string()
}

fn default_report_file() -> String {
    "git.txt".to_string()
}

fn default_output_file() -> String {
    "output.txt".to_string()
}

fn default_timings_file() -> String {
    "timings.csv".to_string()
}

fn default_ceiling() -> String {
    "60m".to_string()
}

impl CourseConfig {
    /// Load a TOML file; relative paths inside it resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.output_dir = resolve(base, &config.output_dir);
            config.roster = resolve(base, &config.roster);
        }
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.script_name.trim().is_empty() {
            return Err(GitsumError::Config("script_name must not be empty".into()));
        }
        if self.student_column == self.repo_column {
            return Err(GitsumError::Config(format!(
                "student_column and repo_column are both '{}'",
                self.student_column
            )));
        }
        self.timeout()?;
        self.ceiling()?;
        Ok(())
    }

    pub fn timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.script_timeout).map_err(|e| {
            GitsumError::Config(format!("Invalid script_timeout '{}': {e}", self.script_timeout))
        })
    }

    fn ceiling(&self) -> Result<Duration> {
        humantime::parse_duration(&self.velocity_ceiling).map_err(|e| {
            GitsumError::Config(format!(
                "Invalid velocity_ceiling '{}': {e}",
                self.velocity_ceiling
            ))
        })
    }

    pub fn analysis_options(&self) -> Result<AnalysisOptions> {
        Ok(AnalysisOptions::new()
            .with_extensions(self.extensions.clone())
            .with_velocity_ceiling(self.ceiling()?)
            .with_detail(self.detail))
    }

    pub fn is_invalid_reference(&self, reference: &str) -> bool {
        self.invalid_markers
            .iter()
            .any(|marker| !marker.is_empty() && reference.contains(marker.as_str()))
    }

    pub fn timings_path(&self) -> PathBuf {
        self.output_dir.join(&self.timings_file)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
