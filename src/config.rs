//! Client configuration.
//!
//! Endpoint and credential are always injected from outside: environment,
//! the OS keyring, or a YAML file that names the environment variable holding
//! the token. Nothing secret lives in source.

use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const ENV_URL: &str = "SANDBOX_URL";
pub const ENV_AUTH_TOKEN: &str = "SANDBOX_AUTH_TOKEN";
pub const ENV_PLATFORM_ID: &str = "SANDBOX_PLATFORM_ID";
pub const ENV_TIMEOUT_SECS: &str = "SANDBOX_TIMEOUT_SECS";
pub const ENV_PROXY_URL: &str = "SANDBOX_PROXY_URL";
pub const ENV_INSTANCE_ID: &str = "SANDBOX_INSTANCE_ID";

const KEYRING_SERVICE: &str = "sandbox-classify";
const KEYRING_USER: &str = "auth-token";

pub const DEFAULT_PLATFORM_ID: &str = "123";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ClientConfig {
    /// Full URL of the sandbox invoke endpoint.
    pub endpoint: String,
    pub auth_token: Option<String>,
    /// Sent as `X-Platform-ID`.
    pub platform_id: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub proxy: Option<String>,
    /// Fixed correlation id; a fresh uuid per request when unset.
    pub instance_id: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("platform_id", &self.platform_id)
            .field("timeout", &self.timeout)
            .field("proxy", &self.proxy)
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

/// On-disk form.
///
/// ```yaml
/// endpoint: http://127.0.0.1:8010/invoke
/// auth_token_env: SANDBOX_AUTH_TOKEN
/// platform_id: "456"
/// timeout_secs: 20
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    endpoint: Option<String>,
    auth_token_env: Option<String>,
    platform_id: Option<String>,
    timeout_secs: Option<u64>,
    proxy: Option<String>,
    instance_id: Option<String>,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth_token: None,
            platform_id: DEFAULT_PLATFORM_ID.to_string(),
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            instance_id: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_platform_id(mut self, id: impl Into<String>) -> Self {
        self.platform_id = id.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }

    /// Build from environment variables.
    ///
    /// - `SANDBOX_URL` (required)
    /// - token: keyring entry `sandbox-classify`/`auth-token`, then `SANDBOX_AUTH_TOKEN`
    /// - `SANDBOX_PLATFORM_ID` (default "123")
    /// - `SANDBOX_TIMEOUT_SECS` (default 30)
    /// - `SANDBOX_PROXY_URL`, `SANDBOX_INSTANCE_ID`
    pub fn from_env() -> Result<Self> {
        let endpoint = non_empty_env(ENV_URL).ok_or_else(|| {
            Error::configuration_with_context(
                "sandbox endpoint is not configured",
                ErrorContext::new()
                    .with_field_path(ENV_URL)
                    .with_source("config_env"),
            )
        })?;
        let mut config = Self::new(endpoint);
        config.apply_env_overrides();
        config.auth_token = resolve_token(ENV_AUTH_TOKEN);
        Ok(config)
    }

    /// Build from a YAML file. Environment variables override file values,
    /// except the token, which is read from the variable the file names
    /// (`auth_token_env`, default `SANDBOX_AUTH_TOKEN`).
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        let endpoint = non_empty_env(ENV_URL).or(file.endpoint).ok_or_else(|| {
            Error::configuration_with_context(
                "sandbox endpoint is not configured",
                ErrorContext::new()
                    .with_field_path("endpoint")
                    .with_source("config_file"),
            )
        })?;
        let mut config = Self::new(endpoint);
        if let Some(id) = file.platform_id {
            config.platform_id = id;
        }
        if let Some(secs) = file.timeout_secs {
            config.timeout = Duration::from_secs(secs.max(1));
        }
        config.proxy = file.proxy;
        config.instance_id = file.instance_id;
        config.apply_env_overrides();

        let token_var = file.auth_token_env.as_deref().unwrap_or(ENV_AUTH_TOKEN);
        config.auth_token = resolve_token(token_var);
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(id) = non_empty_env(ENV_PLATFORM_ID) {
            self.platform_id = id;
        }
        if let Some(secs) = env::var(ENV_TIMEOUT_SECS)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(proxy) = non_empty_env(ENV_PROXY_URL) {
            self.proxy = Some(proxy);
        }
        if let Some(id) = non_empty_env(ENV_INSTANCE_ID) {
            self.instance_id = Some(id);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            Error::configuration_with_context(
                "sandbox endpoint is not a valid URL",
                ErrorContext::new()
                    .with_field_path("endpoint")
                    .with_details(e.to_string()),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                "sandbox endpoint must be http or https",
                ErrorContext::new()
                    .with_field_path("endpoint")
                    .with_details(format!("scheme '{}'", url.scheme())),
            ));
        }
        if self.timeout.is_zero() {
            return Err(Error::configuration_with_context(
                "timeout must be positive",
                ErrorContext::new().with_field_path("timeout"),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn resolve_token(env_var: &str) -> Option<String> {
    // 1. Try Keyring
    if let Ok(entry) = Entry::new(KEYRING_SERVICE, KEYRING_USER) {
        if let Ok(token) = entry.get_password() {
            if !token.trim().is_empty() {
                return Some(token);
            }
        }
    }

    // 2. Try Environment Variable
    non_empty_env(env_var)
}
