//! Configuration sections and their serde defaults

use bankr_types::{ColorChoice, OutputFormat, StateLimits};
use serde::{Deserialize, Serialize};

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Table,
            color: ColorChoice::Auto,
        }
    }
}

/// Snapshot size limits enforced before analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_processes")]
    pub max_processes: usize,
    #[serde(default = "default_max_resources")]
    pub max_resources: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_processes: StateLimits::DEFAULT_MAX,
            max_resources: StateLimits::DEFAULT_MAX,
        }
    }
}

impl From<&LimitsConfig> for StateLimits {
    fn from(limits: &LimitsConfig) -> Self {
        StateLimits::new(limits.max_processes, limits.max_resources)
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_max_processes() -> usize {
    StateLimits::DEFAULT_MAX
}

fn default_max_resources() -> usize {
    StateLimits::DEFAULT_MAX
}
