use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::llm::provider::{ProviderId, api_key_env, default_model, model_env};

pub const PROVIDER_ENV: &str = "CHAT_PROVIDER";
pub const CONFIG_ENV: &str = "AICHAT_CONFIG";
pub const DEFAULT_PROVIDER: ProviderId = ProviderId::Groq;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "{key_env} not set!\n1. Export {key_env}=<your key>, or put {key_env}=<your key> in a .env file in this directory\n2. Or pick another provider: export CHAT_PROVIDER=ollama"
    )]
    MissingCredential {
        provider: ProviderId,
        key_env: &'static str,
    },
    #[error("{provider} doesn't need an API key (local model)")]
    NotApplicable { provider: ProviderId },
    #[error("Unsupported provider '{value}'. Supported values: groq, openai, anthropic, ollama.")]
    UnsupportedProvider { value: String },
    #[error("Cannot resolve config path: set AICHAT_CONFIG or HOME/XDG_CONFIG_HOME.")]
    ConfigPath,
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Config file '{}' does not contain a [profiles] section.", path.display())]
    MissingProfiles { path: PathBuf },
    #[error("Profile '{name}' not found in config file '{}'.", path.display())]
    ProfileNotFound { name: String, path: PathBuf },
}

/// One `[profiles.<name>]` table of the config file.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub system: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub profile: Option<String>,
}

/// Everything a [`crate::client::ChatClient`] needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub provider: ProviderId,
    pub model: String,
    /// Always `None` for ollama. After [`ChatSettings::inspect`] it may also
    /// be `None` for a hosted provider whose key is unset.
    pub api_key: Option<String>,
    pub system_prompt: String,
}

impl ChatSettings {
    /// Resolves from the process environment and, if named, a config profile.
    pub fn resolve(overrides: &Overrides) -> Result<Self, ConfigError> {
        let profile = overrides_profile(overrides)?;
        Self::resolve_with(overrides, profile.as_ref(), process_env)
    }

    /// Precedence: command line, then environment, then profile, then built-in default.
    pub fn resolve_with(
        overrides: &Overrides,
        profile: Option<&ProfileConfig>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let settings = Self::inspect_with(overrides, profile, lookup)?;
        settings.require_credential()?;
        Ok(settings)
    }

    /// Like [`ChatSettings::resolve`], but a missing key leaves `api_key` empty
    /// instead of failing. Used by `config check` to report what is absent.
    pub fn inspect(overrides: &Overrides) -> Result<Self, ConfigError> {
        let profile = overrides_profile(overrides)?;
        Self::inspect_with(overrides, profile.as_ref(), process_env)
    }

    pub fn inspect_with(
        overrides: &Overrides,
        profile: Option<&ProfileConfig>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = non_empty(lookup);

        let provider: ProviderId = match non_blank(overrides.provider.as_deref()) {
            Some(value) => value.parse()?,
            None => match lookup(PROVIDER_ENV) {
                Some(value) => value.parse()?,
                None => match profile.and_then(|p| non_blank(p.provider.as_deref())) {
                    Some(value) => value.parse()?,
                    None => DEFAULT_PROVIDER,
                },
            },
        };

        let profile_model = profile
            .filter(|p| {
                non_blank(p.provider.as_deref())
                    .and_then(|value| value.parse::<ProviderId>().ok())
                    .is_none_or(|bound| bound == provider)
            })
            .and_then(|p| non_blank(p.model.as_deref()))
            .map(str::to_string);
        let model = non_blank(overrides.model.as_deref())
            .map(str::to_string)
            .or_else(|| lookup(model_env(provider)))
            .or(profile_model)
            .unwrap_or_else(|| default_model(provider).to_string());

        let api_key = match resolve_api_key_from(provider, &lookup) {
            Ok(key) => Some(key),
            Err(ConfigError::MissingCredential { .. } | ConfigError::NotApplicable { .. }) => None,
            Err(err) => return Err(err),
        };

        let system_prompt = profile
            .and_then(|p| non_blank(p.system.as_deref()))
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
            .to_string();

        Ok(Self {
            provider,
            model,
            api_key,
            system_prompt,
        })
    }

    /// Fails with `MissingCredential` when a hosted provider has no key.
    pub fn require_credential(&self) -> Result<(), ConfigError> {
        match (api_key_env(self.provider), &self.api_key) {
            (Some(key_env), None) => Err(ConfigError::MissingCredential {
                provider: self.provider,
                key_env,
            }),
            _ => Ok(()),
        }
    }
}

fn overrides_profile(overrides: &Overrides) -> Result<Option<ProfileConfig>, ConfigError> {
    overrides.profile.as_deref().map(load_profile).transpose()
}

/// Reads `CHAT_PROVIDER`, falling back to groq when unset or blank.
pub fn resolve_provider() -> Result<ProviderId, ConfigError> {
    resolve_provider_from(process_env)
}

pub fn resolve_provider_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ProviderId, ConfigError> {
    match non_empty(lookup)(PROVIDER_ENV) {
        Some(value) => value.parse(),
        None => Ok(DEFAULT_PROVIDER),
    }
}

pub fn resolve_api_key(provider: ProviderId) -> Result<String, ConfigError> {
    resolve_api_key_from(provider, process_env)
}

/// Ollama has no credential, so asking for one is an error rather than `None`.
pub fn resolve_api_key_from(
    provider: ProviderId,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let key_env = api_key_env(provider).ok_or(ConfigError::NotApplicable { provider })?;
    non_empty(lookup)(key_env).ok_or(ConfigError::MissingCredential { provider, key_env })
}

pub fn resolve_model(provider: ProviderId) -> String {
    resolve_model_from(provider, process_env)
}

pub fn resolve_model_from(provider: ProviderId, lookup: impl Fn(&str) -> Option<String>) -> String {
    non_empty(lookup)(model_env(provider)).unwrap_or_else(|| default_model(provider).to_string())
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, ConfigError> {
    let path = config_path()?;
    let config = read_config_file(&path)?;
    select_profile(config, name, &path)
}

/// Loads the config file and, when `profile` is given, checks that it exists
/// and names a supported provider. Returns the path that was checked.
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, ConfigError> {
    let path = config_path()?;
    let config = read_config_file(&path)?;

    if let Some(name) = profile {
        let profile = select_profile(config, name, &path)?;
        if let Some(provider) = non_blank(profile.provider.as_deref()) {
            provider.parse::<ProviderId>()?;
        }
    }

    Ok(path)
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&raw, path)
}

fn parse_config(raw: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn select_profile(config: ConfigFile, name: &str, path: &Path) -> Result<ProfileConfig, ConfigError> {
    let mut profiles = config.profiles.ok_or_else(|| ConfigError::MissingProfiles {
        path: path.to_path_buf(),
    })?;
    profiles
        .remove(name)
        .ok_or_else(|| ConfigError::ProfileNotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        })
}

fn config_path() -> Result<PathBuf, ConfigError> {
    config_path_from(process_env)
}

fn config_path_from(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf, ConfigError> {
    let lookup = non_empty(lookup);

    if let Some(path) = lookup(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    if let Some(xdg) = lookup("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("aichat").join("config.toml"));
    }

    let home = lookup("HOME").ok_or(ConfigError::ConfigPath)?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("aichat")
        .join("config.toml"))
}

fn process_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

/// Wraps a lookup so blank values read as unset. Other values come back as-is.
fn non_empty(lookup: impl Fn(&str) -> Option<String>) -> impl Fn(&str) -> Option<String> {
    move |name: &str| lookup(name).filter(|value| !value.trim().is_empty())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
