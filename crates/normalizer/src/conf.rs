//! Conf — config loading from file and environment variables.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizerConfig {
    /// Path of the rulebase file to compile.
    pub rulebase: String,
    /// Print the main component as a DOT graph after optimization and exit.
    pub dump_dot: bool,
    /// Log graph statistics after the rulebase is built.
    pub report_stats: bool,
    /// Enable per-edge trace output in the engine.
    pub debug_graph: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            rulebase: String::new(),
            dump_dot: false,
            report_stats: false,
            debug_graph: false,
        }
    }
}

impl NormalizerConfig {
    /// Load configuration. Priority: environment variables > config file >
    /// defaults.
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var("NORMTAIL_CONFIG_FILE").unwrap_or_else(|_| "/etc/normtail/normtail.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        if let Ok(rulebase) = std::env::var("NORMTAIL_RULEBASE") {
            config.rulebase = rulebase;
        }
        if let Ok(v) = std::env::var("NORMTAIL_DOT") {
            config.dump_dot = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("NORMTAIL_STATS") {
            config.report_stats = v == "1" || v.eq_ignore_ascii_case("true");
        }

        Ok(config)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Check that required values are present and point at real files.
    pub fn validate(&self) -> Result<(), String> {
        if self.rulebase.is_empty() {
            return Err("no rulebase configured (set NORMTAIL_RULEBASE or pass a path)".to_string());
        }
        if !Path::new(&self.rulebase).exists() {
            return Err(format!("rulebase not found: {}", self.rulebase));
        }
        Ok(())
    }
}
