//! Application settings.
//!
//! Four layers, applied in order so that later ones win: built-in defaults,
//! `.grounded/config.yaml`, `GROUNDED_*` environment variables, then flags.
//! The corpus directory is resolved against the workspace root.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Generation providers the engine knows how to talk to.
pub const KNOWN_PROVIDERS: [&str; 3] = ["ollama", "openai", "groq"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root; `.grounded/` lives here
    pub workspace: PathBuf,
    pub config_file: Option<PathBuf>,
    /// Corpus directory, relative paths resolve against `workspace`
    pub data_dir: PathBuf,
    /// One of `KNOWN_PROVIDERS`
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub log_level: Option<String>,
    pub log_json: bool,
    pub verbose: bool,
    pub no_color: bool,
    /// Named provider blocks from the config file
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    pub active_provider: String,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// One provider block. Blocks with `apiKeyEnv` speak the OpenAI chat
/// completions dialect (OpenAI, Groq, vLLM); the rest are Ollama.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    #[serde(rename_all = "camelCase")]
    OpenAI {
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Ollama {
        endpoint: String,
        model: String,
        embedding_model: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAI { model, .. } | ProviderConfig::Ollama { model, .. } => model,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }
}

/// Flag values from the command line. `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub workspace: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub log_level: Option<String>,
    pub log_json: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// On-disk shape of `config.yaml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileLayer {
    llm: Option<LlmConfig>,
    #[serde(default)]
    workspace: WorkspaceSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkspaceSection {
    path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl FileLayer {
    fn read(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::FatalConfig(format!("Cannot read {}: {}", path.display(), e))
        })?;

        serde_yaml::from_str(&raw).map_err(|e| {
            AppError::FatalConfig(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    fn apply(self, config: &mut AppConfig) {
        config.workspace = self.workspace.path.unwrap_or(config.workspace.clone());
        if let Some(dir) = self.workspace.data_dir {
            config.data_dir = dir;
        }

        config.log_level = self.logging.level.or(config.log_level.take());
        if let Some(color) = self.logging.color {
            config.no_color = !color;
        }
        config.log_json = self.logging.json.unwrap_or(config.log_json);

        let Some(llm) = self.llm else { return };
        config.provider = llm.active_provider.clone();
        if let Some(active) = llm.providers.get(&llm.active_provider) {
            config.model = active.model().to_string();
            config.endpoint = active.endpoint().map(str::to_string);
        }
        config.llm = Some(llm);
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            data_dir: PathBuf::from("data"),
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            log_level: None,
            log_json: false,
            verbose: false,
            no_color: false,
            llm: None,
        }
    }
}

impl AppConfig {
    /// Resolve settings from every layer.
    ///
    /// The workspace and config file location come from the flags or the
    /// environment first, since they decide which `config.yaml` is read.
    /// Recognised variables: `GROUNDED_WORKSPACE`, `GROUNDED_CONFIG`,
    /// `GROUNDED_DATA_DIR`, `GROUNDED_PROVIDER`, `GROUNDED_MODEL`,
    /// `GROUNDED_ENDPOINT`, `GROUNDED_API_KEY`, `RUST_LOG` and `NO_COLOR`.
    ///
    /// ```no_run
    /// use grounded_core::config::{AppConfig, CliOverrides};
    ///
    /// let config = AppConfig::load(&CliOverrides::default()).expect("config");
    /// println!("corpus: {}", config.data_path().display());
    /// ```
    pub fn load(overrides: &CliOverrides) -> AppResult<Self> {
        Self::load_from(overrides, |key| std::env::var(key).ok())
    }

    /// `load` with an injectable environment.
    pub fn load_from(
        overrides: &CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(ws) = overrides.workspace.clone().or_else(|| env("GROUNDED_WORKSPACE").map(PathBuf::from)) {
            config.workspace = ws;
        }
        config.config_file = overrides
            .config_file
            .clone()
            .or_else(|| env("GROUNDED_CONFIG").map(PathBuf::from));

        if !config.workspace.is_dir() {
            return Err(AppError::FatalConfig(format!(
                "Workspace directory does not exist: {}",
                config.workspace.display()
            )));
        }

        match &config.config_file {
            Some(explicit) => FileLayer::read(explicit)?.apply(&mut config),
            None => {
                let default_path = config.grounded_dir().join("config.yaml");
                if default_path.is_file() {
                    FileLayer::read(&default_path)?.apply(&mut config);
                }
            }
        }

        config.apply_env(&env);
        config.apply_overrides(overrides);
        Ok(config)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(dir) = env("GROUNDED_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        self.provider = env("GROUNDED_PROVIDER").unwrap_or(std::mem::take(&mut self.provider));
        self.model = env("GROUNDED_MODEL").unwrap_or(std::mem::take(&mut self.model));
        self.endpoint = env("GROUNDED_ENDPOINT").or(self.endpoint.take());
        self.api_key = env("GROUNDED_API_KEY");
        self.log_level = env("RUST_LOG").or(self.log_level.take());
        self.no_color |= env("NO_COLOR").is_some();
    }

    /// Flags win over everything else. `--verbose` implies `debug` unless
    /// a level was given some other way.
    pub fn apply_overrides(&mut self, flags: &CliOverrides) {
        if let Some(dir) = &flags.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(provider) = &flags.provider {
            self.provider = provider.clone();
        }
        if let Some(model) = &flags.model {
            self.model = model.clone();
        }
        if flags.log_level.is_some() {
            self.log_level = flags.log_level.clone();
        }

        self.verbose |= flags.verbose;
        if self.verbose && self.log_level.is_none() {
            self.log_level = Some("debug".to_string());
        }
        self.no_color |= flags.no_color;
        self.log_json |= flags.log_json;
    }

    pub fn grounded_dir(&self) -> PathBuf {
        self.workspace.join(".grounded")
    }

    /// Corpus directory, resolved against the workspace when relative.
    pub fn data_path(&self) -> PathBuf {
        if self.data_dir.is_absolute() {
            self.data_dir.clone()
        } else {
            self.workspace.join(&self.data_dir)
        }
    }

    pub fn provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref()?.providers.get(provider)
    }

    /// Variable that should hold the key for `provider`.
    fn api_key_var(&self, provider: &str) -> String {
        match self.provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env.clone(),
            _ => format!("{}_API_KEY", provider.to_uppercase()),
        }
    }

    /// `GROUNDED_API_KEY` first, then the provider's own key variable.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(self.api_key_var(provider)).ok())
    }

    /// Reject settings no backend can be built from.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();

        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::FatalConfig(format!(
                "Unknown provider '{}', expected one of: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.model.trim().is_empty() {
            return Err(AppError::FatalConfig("Model identifier is empty".to_string()));
        }

        if provider != "ollama" && self.resolve_api_key(provider).is_none() {
            return Err(AppError::FatalConfig(format!(
                "No API key for {}: set {}",
                provider,
                self.api_key_var(provider)
            )));
        }

        Ok(())
    }
}
