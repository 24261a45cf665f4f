use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Immutable engine parameters. Constructed once and passed into the
/// estimator/distributor/matcher explicitly; algorithmic code never reads
/// the process environment.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Global inflation index applied to every estimate (1.0 = neutral).
    pub inflation_index: f64,
    /// Global market-location index (1.0 = neutral).
    pub market_index: f64,
    /// Base margin rate before the quality-tier offset.
    pub base_margin: f64,
    /// Overhead rate applied to every allocation.
    pub overhead_pct: f64,
    /// Default VAT percentage when the request does not set one.
    pub default_tax_percent: f64,
    /// Quote validity window in days.
    pub validity_days: i64,
    pub history: HistoryPolicy,
    pub nudge: NudgeRules,
}

/// Policy parameters for historical blending. The 60/40 split and the 0.15
/// cutoff are inherited defaults, not derived business rules.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryPolicy {
    /// Share of the final price taken from the historical average.
    pub blend_weight: f64,
    /// Similarity scores at or below this value are discarded as noise.
    pub similarity_cutoff: f64,
    /// How many similar quotes feed the suggestion.
    pub max_matches: usize,
    /// How many recent entries per owner are scanned.
    pub window: usize,
}

/// Cosmetic-rounding policy: totals ending in 00/50 get a small
/// deterministic push so amounts do not look invented.
#[derive(Clone, Debug, PartialEq)]
pub struct NudgeRules {
    pub min_step: f64,
    pub max_step: f64,
    /// Ceiling, as a share of the total, for the final aesthetic shift.
    pub max_correction_pct: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inflation_index: 1.04,
            market_index: 1.0,
            base_margin: 0.18,
            overhead_pct: 0.10,
            default_tax_percent: 21.0,
            validity_days: 30,
            history: HistoryPolicy {
                blend_weight: 0.4,
                similarity_cutoff: 0.15,
                max_matches: 3,
                window: 30,
            },
            nudge: NudgeRules { min_step: 3.7, max_step: 11.0, max_correction_pct: 0.02 },
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub enabled: bool,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_enabled: Option<bool>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                enabled: false,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                embedding_model: "nomic-embed-text".to_string(),
                timeout_secs: 20,
            },
            database: DatabaseConfig {
                url: "sqlite://cotiza.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Defaults → config file → `COTIZA_*` environment → explicit
    /// overrides, then validation.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cotiza.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(inflation_index) = engine.inflation_index {
                self.engine.inflation_index = inflation_index;
            }
            if let Some(market_index) = engine.market_index {
                self.engine.market_index = market_index;
            }
            if let Some(base_margin) = engine.base_margin {
                self.engine.base_margin = base_margin;
            }
            if let Some(overhead_pct) = engine.overhead_pct {
                self.engine.overhead_pct = overhead_pct;
            }
            if let Some(tax) = engine.default_tax_percent {
                self.engine.default_tax_percent = tax;
            }
            if let Some(validity_days) = engine.validity_days {
                self.engine.validity_days = validity_days;
            }
            if let Some(blend_weight) = engine.history_blend_weight {
                self.engine.history.blend_weight = blend_weight;
            }
            if let Some(cutoff) = engine.similarity_cutoff {
                self.engine.history.similarity_cutoff = cutoff;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(enabled) = llm.enabled {
                self.llm.enabled = enabled;
            }
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(api_key.into());
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(embedding_model) = llm.embedding_model {
                self.llm.embedding_model = embedding_model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("COTIZA_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("COTIZA_LLM_ENABLED") {
            self.llm.enabled = parse_bool("COTIZA_LLM_ENABLED", &value)?;
        }
        if let Some(value) = read_env("COTIZA_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("COTIZA_LLM_API_KEY") {
            self.llm.api_key = Some(value.into());
        }
        if let Some(value) = read_env("COTIZA_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("COTIZA_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("COTIZA_ENGINE_INFLATION_INDEX") {
            self.engine.inflation_index = parse_f64("COTIZA_ENGINE_INFLATION_INDEX", &value)?;
        }
        if let Some(value) = read_env("COTIZA_ENGINE_MARKET_INDEX") {
            self.engine.market_index = parse_f64("COTIZA_ENGINE_MARKET_INDEX", &value)?;
        }
        if let Some(value) = read_env("COTIZA_ENGINE_BASE_MARGIN") {
            self.engine.base_margin = parse_f64("COTIZA_ENGINE_BASE_MARGIN", &value)?;
        }
        if let Some(value) = read_env("COTIZA_ENGINE_OVERHEAD_PCT") {
            self.engine.overhead_pct = parse_f64("COTIZA_ENGINE_OVERHEAD_PCT", &value)?;
        }
        if let Some(value) = read_env("COTIZA_ENGINE_TAX_PERCENT") {
            self.engine.default_tax_percent = parse_f64("COTIZA_ENGINE_TAX_PERCENT", &value)?;
        }
        if let Some(value) = read_env("COTIZA_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("COTIZA_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(enabled) = overrides.llm_enabled {
            self.llm.enabled = enabled;
        }
        if let Some(provider) = overrides.llm_provider {
            self.llm.provider = provider;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_engine(&self.engine)?;
        validate_llm(&self.llm)?;
        validate_database(&self.database)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.inflation_index <= 0.0 || engine.market_index <= 0.0 {
        return Err(ConfigError::Validation(
            "engine indices must be strictly positive".to_string(),
        ));
    }
    if engine.base_margin < 0.0 || engine.base_margin > 1.0 {
        return Err(ConfigError::Validation("engine.base_margin must be in 0..=1".to_string()));
    }
    if engine.overhead_pct < 0.0 || engine.overhead_pct > 1.0 {
        return Err(ConfigError::Validation("engine.overhead_pct must be in 0..=1".to_string()));
    }
    if engine.default_tax_percent < 0.0 || engine.default_tax_percent >= 100.0 {
        return Err(ConfigError::Validation(
            "engine.default_tax_percent must be in 0..100".to_string(),
        ));
    }
    if engine.validity_days <= 0 {
        return Err(ConfigError::Validation("engine.validity_days must be positive".to_string()));
    }
    if !(0.0..=1.0).contains(&engine.history.blend_weight) {
        return Err(ConfigError::Validation(
            "engine.history_blend_weight must be in 0..=1".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&engine.history.similarity_cutoff) {
        return Err(ConfigError::Validation(
            "engine.similarity_cutoff must be in 0..1".to_string(),
        ));
    }
    if engine.nudge.min_step <= 0.0 || engine.nudge.max_step < engine.nudge.min_step {
        return Err(ConfigError::Validation(
            "engine nudge steps must satisfy 0 < min_step <= max_step".to_string(),
        ));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if !llm.enabled {
        return Ok(());
    }
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation("llm.timeout_secs must be in range 1..=300".to_string()));
    }
    match llm.provider {
        LlmProvider::OpenAi | LlmProvider::Anthropic => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for openai/anthropic providers".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }
    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cotiza.toml"), PathBuf::from("config/cotiza.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    llm: Option<LlmPatch>,
    database: Option<DatabasePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    inflation_index: Option<f64>,
    market_index: Option<f64>,
    base_margin: Option<f64>,
    overhead_pct: Option<f64>,
    default_tax_percent: Option<f64>,
    validity_days: Option<i64>,
    history_blend_weight: Option<f64>,
    similarity_cutoff: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    enabled: Option<bool>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    embedding_model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::sync::{Mutex, OnceLock};

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    #[test]
    fn defaults_validate() {
        let _guard = env_lock().lock().expect("env lock");
        let config = AppConfig::load(LoadOptions::default()).expect("default config");
        assert_eq!(config.engine.history.blend_weight, 0.4);
        assert_eq!(config.engine.history.similarity_cutoff, 0.15);
        assert!(!config.llm.enabled);
    }

    #[test]
    fn file_patch_and_env_interpolation_apply() {
        let _guard = env_lock().lock().expect("env lock");
        env::set_var("TEST_COTIZA_KEY", "sk-file-key");

        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("cotiza.toml");
        fs::write(
            &path,
            r#"
[engine]
inflation_index = 1.08
history_blend_weight = 0.5

[llm]
enabled = true
provider = "openai"
api_key = "${TEST_COTIZA_KEY}"
model = "gpt-4o-mini"
"#,
        )
        .expect("write config");

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .expect("load config");

        assert_eq!(config.engine.inflation_index, 1.08);
        assert_eq!(config.engine.history.blend_weight, 0.5);
        assert!(config.llm.enabled);
        assert_eq!(config.llm.model, "gpt-4o-mini");

        clear_vars(&["TEST_COTIZA_KEY"]);
    }

    #[test]
    fn env_overrides_beat_file_and_explicit_overrides_beat_env() {
        let _guard = env_lock().lock().expect("env lock");
        env::set_var("COTIZA_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("COTIZA_LOG_LEVEL", "warn");

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                log_level: Some("debug".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("load config");

        assert_eq!(config.database.url, "sqlite://from-env.db");
        assert_eq!(config.logging.level, "debug");

        clear_vars(&["COTIZA_DATABASE_URL", "COTIZA_LOG_LEVEL"]);
    }

    #[test]
    fn enabled_llm_without_api_key_fails_validation() {
        let _guard = env_lock().lock().expect("env lock");
        env::set_var("COTIZA_LLM_ENABLED", "true");
        env::set_var("COTIZA_LLM_PROVIDER", "openai");

        let error = AppConfig::load(LoadOptions::default()).expect_err("missing api key");
        assert!(matches!(error, ConfigError::Validation(message) if message.contains("api_key")));

        clear_vars(&["COTIZA_LLM_ENABLED", "COTIZA_LLM_PROVIDER"]);
    }

    #[test]
    fn invalid_engine_values_fail_validation() {
        let _guard = env_lock().lock().expect("env lock");
        env::set_var("COTIZA_ENGINE_BASE_MARGIN", "1.5");

        let error = AppConfig::load(LoadOptions::default()).expect_err("margin out of range");
        assert!(matches!(error, ConfigError::Validation(message) if message.contains("base_margin")));

        clear_vars(&["COTIZA_ENGINE_BASE_MARGIN"]);
    }

    #[test]
    fn default_log_format_is_compact() {
        let _guard = env_lock().lock().expect("env lock");
        let config = AppConfig::load(LoadOptions::default()).expect("default config");
        assert!(matches!(config.logging.format, LogFormat::Compact));
    }
}
