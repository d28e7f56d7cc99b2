use std::{fmt, sync::OnceLock};

use color_eyre::eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::endpoint::{Endpoint, Endpoints};

/// Build environment the client runs in
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Mode {
    /// Local build, traffic goes through the dev proxy
    Development,
    /// Deployed build, roots may point at other hosts
    Production,
}

impl Mode {
    /// Mode implied by the build profile
    pub const fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Mode::Development
        } else {
            Mode::Production
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Mode::Production),
            "development" | "dev" => Some(Mode::Development),
            _ => None,
        }
    }

    pub const fn is_production(self) -> bool {
        matches!(self, Mode::Production)
    }
}

impl TryFrom<String> for Mode {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Mode::parse(&value).ok_or_else(|| format!("unknown mode `{value}`"))
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::from_build()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Development => f.write_str("development"),
            Mode::Production => f.write_str("production"),
        }
    }
}

/// Everything the configuration record is derived from
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct EnvInputs {
    pub mode: Mode,
    pub api_url: Option<String>,
    pub assets_url: Option<String>,
}

impl EnvInputs {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            api_url: None,
            assets_url: None,
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_assets_url(mut self, url: impl Into<String>) -> Self {
        self.assets_url = Some(url.into());
        self
    }

    /// Read inputs through `lookup`, which maps a variable name to its value.
    /// An unset or empty mode variable falls back to the build profile.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup(constants::MODE_VAR).filter(|value| !value.is_empty()) {
            Some(value) => Mode::parse(&value).unwrap_or_else(|| {
                let fallback = Mode::from_build();
                warn!(
                    "unrecognised {} value `{value}`, using {fallback}",
                    constants::MODE_VAR
                );
                fallback
            }),
            None => Mode::from_build(),
        };
        Self {
            mode,
            api_url: lookup(constants::API_URL_VAR),
            assets_url: lookup(constants::ASSETS_URL_VAR),
        }
    }

    /// Read inputs from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Layer `overrides` on top, keeping current values where it has none
    pub fn apply(self, overrides: Overrides) -> Self {
        Self {
            mode: overrides.mode.unwrap_or(self.mode),
            api_url: overrides.api_url.or(self.api_url),
            assets_url: overrides.assets_url.or(self.assets_url),
        }
    }
}

/// Partial inputs from a config file or the command line
#[derive(Clone, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overrides {
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub assets_url: Option<String>,
}

impl Overrides {
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| eyre!("Failed to parse configuration: {e}"))
    }
}

pub fn resolve_base_url(inputs: &EnvInputs) -> String {
    resolve_root(
        inputs.mode,
        inputs.api_url.as_deref(),
        constants::DEFAULT_API_ROOT,
    )
}

pub fn resolve_assets_url(inputs: &EnvInputs) -> String {
    resolve_root(
        inputs.mode,
        inputs.assets_url.as_deref(),
        constants::DEFAULT_ASSETS_ROOT,
    )
}

// Development always goes through the proxy, so overrides only count in production
fn resolve_root(mode: Mode, override_url: Option<&str>, fallback: &str) -> String {
    match override_url {
        Some(url) if mode.is_production() && !url.is_empty() => url.to_owned(),
        _ => fallback.to_owned(),
    }
}

static GLOBAL: OnceLock<ApiConfig> = OnceLock::new();

/// Resolved URL roots and the endpoint table. Immutable once built.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct ApiConfig {
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(rename = "assetsURL")]
    pub assets_url: String,
    #[serde(rename = "backendURL")]
    pub backend_url: &'static str,
    pub endpoints: Endpoints,
}

impl ApiConfig {
    pub fn new(inputs: &EnvInputs) -> Self {
        let config = Self {
            base_url: resolve_base_url(inputs),
            assets_url: resolve_assets_url(inputs),
            backend_url: constants::BACKEND_URL,
            endpoints: Endpoints::new(),
        };
        debug!(
            mode = %inputs.mode,
            base_url = %config.base_url,
            assets_url = %config.assets_url,
            "Resolved API configuration"
        );
        config
    }

    /// Process-wide configuration, built from the environment on first access
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| Self::new(&EnvInputs::from_env()))
    }

    /// Build the process-wide configuration from `inputs`.
    /// Fails if it was already built.
    pub fn init_global(inputs: &EnvInputs) -> Result<&'static Self> {
        GLOBAL
            .set(Self::new(inputs))
            .map_err(|_| eyre!("API configuration is already initialised"))?;
        Ok(Self::global())
    }

    /// `base_url` followed by `endpoint`, nothing inserted in between
    pub fn get_api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        self.get_api_url(self.endpoints.get(endpoint))
    }

    /// `{assets_url}/{path}` with at most one leading `/` dropped from `path`
    pub fn get_assets_url(&self, path: &str) -> String {
        let clean_path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}", self.assets_url, clean_path)
    }

    pub fn health_url(&self) -> String {
        self.get_api_url(self.endpoints.health)
    }
}
