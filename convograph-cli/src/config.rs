use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use validator::Validate;

use convograph::episodes::SUMMARY_FILE_NAME;
use convograph::{ConnectionParams, ModelConfig};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Folders shared with the export parser.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataFolders {
    /// Where the raw chat export was unpacked.
    #[serde(default = "default_data_folder")]
    pub data_folder: PathBuf,
    /// Where the parser wrote `conversation_summary.json`.
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,
}

impl Default for DataFolders {
    fn default() -> Self {
        Self {
            data_folder: default_data_folder(),
            output_folder: default_output_folder(),
        }
    }
}

fn default_data_folder() -> PathBuf {
    PathBuf::from("./data")
}

fn default_output_folder() -> PathBuf {
    PathBuf::from("./output")
}

/// Application configuration loaded from the YAML config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub openai_data: DataFolders,

    /// Graph store connection. Env: `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD`.
    #[serde(rename = "NEO-4j")]
    pub neo4j: ConnectionParams,

    pub model_config: ModelConfig,

    /// Fail instead of stamping episodes with the current time.
    #[serde(default)]
    pub strict_timestamps: bool,

    /// Partition label; used when the `NEO-4j` section sets none.
    #[serde(default)]
    pub group_id: String,
}

impl AppConfig {
    /// Load `.env`, parse `path`, apply environment overrides and validate.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting connection parameters are incomplete.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        // A missing .env is fine.
        let _ = dotenvy::dotenv();

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
        let mut config = Self::from_yaml(&raw)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let mut config: AppConfig = serde_yaml::from_str(raw)?;
        if config.neo4j.group_id.is_empty() {
            config.neo4j.group_id = config.group_id.clone();
        }
        Ok(config)
    }

    /// Override connection settings from `lookup` (normally the process env).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.neo4j.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.neo4j.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.neo4j.password = password;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.neo4j
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid NEO-4j section: {}", e))
    }

    /// Location of the parser's summary file.
    pub fn summary_path(&self) -> PathBuf {
        self.openai_data.output_folder.join(SUMMARY_FILE_NAME)
    }
}
