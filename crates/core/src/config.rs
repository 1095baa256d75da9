use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "mlog.toml";

/// Instruction cap enforced by the processor runtime.
pub const DEFAULT_MAX_INSTRUCTIONS: usize = 1000;
pub const DEFAULT_MAX_LABELS: usize = 500;
pub const DEFAULT_MAX_STATEMENT_TOKENS: usize = 16;
pub const DEFAULT_DISCARD_NAME: &str = "_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{field} in '{path}' must be greater than zero")]
    ZeroLimit { path: PathBuf, field: &'static str },
    #[error("analysis.discard_name in '{path}' must not be empty")]
    EmptyDiscardName { path: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub analysis: AnalyzerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub max_instructions: usize,
    pub max_labels: usize,
    pub max_statement_tokens: usize,
    /// Conventional name for values that are written but intentionally unused.
    pub discard_name: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_instructions: DEFAULT_MAX_INSTRUCTIONS,
            max_labels: DEFAULT_MAX_LABELS,
            max_statement_tokens: DEFAULT_MAX_STATEMENT_TOKENS,
            discard_name: DEFAULT_DISCARD_NAME.to_string(),
        }
    }
}

impl AnalyzerConfig {
    pub fn from_toml_str(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        file.analysis.validated(path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &text)
    }

    /// Walks from `start` up through its ancestors looking for `mlog.toml`.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    fn validated(self, path: &Path) -> Result<Self, ConfigError> {
        let limits = [
            ("analysis.max_instructions", self.max_instructions),
            ("analysis.max_labels", self.max_labels),
            ("analysis.max_statement_tokens", self.max_statement_tokens),
        ];
        if let Some((field, _)) = limits.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroLimit {
                path: path.to_path_buf(),
                field,
            });
        }
        if self.discard_name.trim().is_empty() {
            return Err(ConfigError::EmptyDiscardName {
                path: path.to_path_buf(),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AnalyzerConfig::from_toml_str(Path::new("mlog.toml"), "").expect("config");
        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.max_instructions, 1000);
        assert_eq!(config.discard_name, "_");
    }

    #[test]
    fn overrides_individual_fields() {
        let text = "[analysis]\nmax_labels = 10\ndiscard_name = \"trash\"\n";
        let config = AnalyzerConfig::from_toml_str(Path::new("mlog.toml"), text).expect("config");
        assert_eq!(config.max_labels, 10);
        assert_eq!(config.discard_name, "trash");
        assert_eq!(config.max_statement_tokens, 16);
    }

    #[test]
    fn rejects_unknown_fields() {
        let error = AnalyzerConfig::from_toml_str(Path::new("mlog.toml"), "[analysis]\nfoo = 1\n")
            .expect_err("must fail");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_zero_limits() {
        let error = AnalyzerConfig::from_toml_str(
            Path::new("mlog.toml"),
            "[analysis]\nmax_instructions = 0\n",
        )
        .expect_err("must fail");
        assert!(error.to_string().contains("analysis.max_instructions"));
    }
}
