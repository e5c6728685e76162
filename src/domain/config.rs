use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

/// Configuration for a generation run.
///
/// Holds the document metadata printed on the title block, the requirement ID
/// format, classifier extensions and the prose service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The name of the system the document specifies.
    pub project_name: String,

    /// The organisation that owns the document.
    pub company_name: String,

    /// The version printed on the title block.
    pub document_version: String,

    /// The status printed on the title block, e.g. `Draft`.
    pub document_status: String,

    /// The number of digits requirement sequence numbers are padded to.
    ///
    /// `1` renders `REQ-DM-1`, `3` renders `REQ-DM-001`.
    digits: usize,

    /// Extra case-insensitive regular expressions marking sensitive data,
    /// added to the built-in list.
    sensitive_patterns: Vec<String>,

    /// Settings for the external prose service.
    pub prose: ProseConfig,
}

/// Settings for the external prose-generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProseConfig {
    /// Model identifier sent to the service.
    pub model: String,

    /// Base URL of the service API.
    pub endpoint: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Maximum number of requests in flight at once.
    pub concurrency: usize,

    /// Seconds to wait for a single response before falling back.
    pub timeout_secs: u64,

    /// Sampling temperature.
    pub temperature: f32,

    /// Upper bound on generated tokens per requirement.
    pub max_output_tokens: u32,
}

impl ProseConfig {
    /// The per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProseConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            concurrency: 4,
            timeout_secs: 30,
            temperature: 0.2,
            max_output_tokens: 256,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            company_name: default_company_name(),
            document_version: default_document_version(),
            document_status: default_document_status(),
            digits: default_digits(),
            sensitive_patterns: Vec::new(),
            prose: ProseConfig::default(),
        }
    }
}

/// Errors raised while reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid configuration TOML.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be encoded.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid. A blank file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Applies the `PROJECT_NAME`, `COMPANY_NAME` and `MODEL_NAME`
    /// environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(project) = lookup("PROJECT_NAME") {
            self.project_name = project;
        }
        if let Some(company) = lookup("COMPANY_NAME") {
            self.company_name = company;
        }
        if let Some(model) = lookup("MODEL_NAME") {
            self.prose.model = model;
        }
        self
    }

    /// Returns the number of digits requirement sequences are padded to.
    #[must_use]
    pub const fn digits(&self) -> usize {
        self.digits
    }

    /// Returns the configured extra sensitive-data patterns.
    #[must_use]
    pub fn sensitive_patterns(&self) -> &[String] {
        &self.sensitive_patterns
    }

    /// Adds a sensitive-data pattern.
    ///
    /// Returns `true` if the pattern was added, `false` if it already existed.
    pub fn add_sensitive_pattern(&mut self, pattern: String) -> bool {
        if self.sensitive_patterns.contains(&pattern) {
            false
        } else {
            self.sensitive_patterns.push(pattern);
            true
        }
    }
}

fn default_project_name() -> String {
    "CRUD Application System".to_string()
}

fn default_company_name() -> String {
    "Your Company Name".to_string()
}

fn default_document_version() -> String {
    "1.0".to_string()
}

fn default_document_status() -> String {
    "Draft".to_string()
}

const fn default_digits() -> usize {
    1
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_project_name")]
        project_name: String,

        #[serde(default = "default_company_name")]
        company_name: String,

        #[serde(default = "default_document_version")]
        document_version: String,

        #[serde(default = "default_document_status")]
        document_status: String,

        #[serde(default = "default_digits")]
        digits: usize,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sensitive_patterns: Vec<String>,

        #[serde(default)]
        prose: ProseConfig,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                project_name,
                company_name,
                document_version,
                document_status,
                digits,
                sensitive_patterns,
                prose,
            } => Self {
                project_name,
                company_name,
                document_version,
                document_status,
                digits,
                sensitive_patterns,
                prose,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            project_name: config.project_name,
            company_name: config.company_name,
            document_version: config.document_version,
            document_status: config.document_status,
            digits: config.digits,
            sensitive_patterns: config.sensitive_patterns,
            prose: config.prose,
        }
    }
}
