//! Loader for Satya configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. [`DEFAULT_YAML`], which wires the conventional `GOOGLE_*` variables in
//!    through `${VAR}` placeholders,
//! 2. any files or inline YAML snippets added on the loader,
//! 3. `SATYA__`-prefixed environment variables (`SATYA__ANALYSIS__MODEL=...`).
//!
//! After merging, every string value has `${VAR}` / `$VAR` placeholders
//! expanded against the process environment. Placeholders naming unset
//! variables are left untouched; [`SatyaConfig::validate`] and
//! [`SearchSettings::credentials`] treat such leftovers as "not configured".
use config::{Config, ConfigError, Environment, File, FileFormat};
use satya_common::observability::LogFormat;
use satya_common::SatyaError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com";
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Base layer applied before any file: credentials come from the usual
/// `GOOGLE_*` environment variables unless a file or `SATYA__` overrides them.
pub const DEFAULT_YAML: &str = r#"
analysis:
  api_key: "${GOOGLE_API_KEY}"
search:
  api_key: "${GOOGLE_SEARCH_API_KEY}"
  engine_id: "${GOOGLE_SEARCH_ENGINE_ID}"
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct SatyaConfig {
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub search: Option<SearchSettings>,
    /// Per-category overrides of the built-in reporting table.
    #[serde(default)]
    pub remedies: BTreeMap<String, RemedyOverride>,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub engine_id: String,
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
}

impl SearchSettings {
    /// `(api_key, engine_id)` when both are present and fully expanded.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if is_configured(&self.api_key) && is_configured(&self.engine_id) {
            Some((self.api_key.as_str(), self.engine_id.as_str()))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RemedyOverride {
    pub link: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub stderr: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            stderr: false,
            dir: None,
            filter: default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl SatyaConfig {
    /// Reject configurations that cannot possibly reach the analysis service.
    pub fn validate(&self) -> Result<(), SatyaError> {
        if !is_configured(&self.analysis.api_key) {
            return Err(SatyaError::Config(
                "analysis.api_key is not set (export GOOGLE_API_KEY or set SATYA__ANALYSIS__API_KEY)"
                    .to_string(),
            ));
        }
        if let Some(t) = self.analysis.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(SatyaError::Config(format!(
                    "analysis.temperature must be within 0.0..=2.0, got {t}"
                )));
            }
        }
        Ok(())
    }
}

fn is_configured(value: &str) -> bool {
    let v = value.trim();
    !v.is_empty() && !v.contains("${")
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.into()
}
fn default_gemini_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.into()
}
fn default_search_endpoint() -> String {
    DEFAULT_SEARCH_ENDPOINT.into()
}
fn default_filter() -> String {
    "info".into()
}
fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => break,
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring.
pub struct SatyaConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SatyaConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SatyaConfigLoader {
    /// Start from [`DEFAULT_YAML`]; `SATYA__` environment overrides are
    /// attached last in [`SatyaConfigLoader::load`].
    ///
    /// ```
    /// use satya_config::SatyaConfigLoader;
    ///
    /// let config = SatyaConfigLoader::new()
    ///     .with_yaml_str("analysis:\n  api_key: inline-key\n")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.analysis.api_key, "inline-key");
    /// assert_eq!(config.analysis.model, "gemini-1.5-flash-latest");
    /// assert_eq!(config.server.port, 5000);
    /// ```
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_YAML, FileFormat::Yaml));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is merged only if present, so env-only deployments work.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests and CLI flags).
    ///
    /// ```
    /// use satya_config::SatyaConfigLoader;
    ///
    /// let cfg = SatyaConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// analysis:
    ///   api_key: "abc"
    /// remedies:
    ///   "Job Scam":
    ///     link: "https://example.org/report"
    ///     description: "Report it here."
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.remedies.len(), 1);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    pub fn load(self) -> Result<SatyaConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("SATYA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
