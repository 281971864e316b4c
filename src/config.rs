use crate::errors::EnomError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const LIVE_ENDPOINT: &str = "https://reseller.enom.com/interface.asp";
pub const TEST_ENDPOINT: &str = "https://resellertest.enom.com/interface.asp";

/// Name of the per-user credentials file looked up in the home directory.
pub const CONFIG_FILE_NAME: &str = ".enomconfig";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub addr: String,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub pass: Option<String>,
}

impl ProxyConfig {
    pub fn url(&self) -> String {
        let base = if self.addr.contains("://") {
            self.addr.clone()
        } else {
            format!("http://{}", self.addr)
        };
        match self.port {
            Some(port) => format!("{}:{}", base.trim_end_matches('/'), port),
            None => base,
        }
    }
}

/// Client configuration. Built once and handed to the transport; nothing
/// reads credentials from process-wide state after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub username: Option<String>,
    pub password: Option<String>,
    pub test_mode: bool,
    pub proxy: Option<ProxyConfig>,
    pub timeout_seconds: u64,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigData {
    pub username: Option<String>,
    pub password: Option<String>,
    pub test_mode: bool,
    pub proxy: Option<ProxyConfig>,
    pub timeout_seconds: u64,
    pub endpoint: Option<String>,
}

/// Values given on the command line. They win over the file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub username: Option<String>,
    pub password: Option<String>,
    pub test_mode: bool,
    pub proxy_addr: Option<String>,
    pub proxy_port: Option<u16>,
    pub proxy_user: Option<String>,
    pub proxy_pass: Option<String>,
}

impl Config {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            test_mode: false,
            proxy: None,
            timeout_seconds: 30,
            endpoint: None,
        }
    }

    /// Load from `~/.enomconfig` and the environment.
    pub fn load() -> Result<Self, EnomError> {
        Self::load_with(None, &ConfigOverrides::default())
    }

    /// Layered load: defaults, then the YAML credentials file (the given
    /// path or `~/.enomconfig`, optional either way), then `ENOM_*`
    /// environment variables, then command-line overrides.
    pub fn load_with(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, EnomError> {
        let mut settings = config::Config::builder()
            .set_default("test_mode", false)?
            .set_default("timeout_seconds", 30)?;

        if let Some(file) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            tracing::debug!("Reading credentials from {}", file.display());
            settings = settings.add_source(
                config::File::new(&file.to_string_lossy(), config::FileFormat::Yaml).required(false),
            );
        }

        settings = Self::apply_env_overrides(settings)?;
        settings = Self::apply_cli_overrides(settings, overrides)?;

        let data: ConfigData = settings.build()?.try_deserialize()?;

        Ok(Config {
            username: data.username.filter(|u| !u.is_empty()),
            password: data.password.filter(|p| !p.is_empty()),
            test_mode: data.test_mode,
            proxy: data.proxy.filter(|p| !p.addr.is_empty()),
            timeout_seconds: data.timeout_seconds,
            endpoint: data.endpoint,
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// The interface URL: an explicit endpoint, else test or live.
    pub fn endpoint_url(&self) -> Result<Url, EnomError> {
        let raw = match &self.endpoint {
            Some(endpoint) => endpoint.as_str(),
            None if self.test_mode => TEST_ENDPOINT,
            None => LIVE_ENDPOINT,
        };
        Url::parse(raw).map_err(|e| EnomError::InvalidArgument(format!("endpoint {}: {}", raw, e)))
    }

    /// Username and password, or `InvalidCredentials` if either is missing.
    pub fn credentials(&self) -> Result<(&str, &str), EnomError> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) => Ok((user, pass)),
            (None, _) => Err(EnomError::InvalidCredentials(
                "Please provide a username (-u) or add it to ~/.enomconfig".to_string(),
            )),
            (_, None) => Err(EnomError::InvalidCredentials(
                "Please provide a password (-p) or add it to ~/.enomconfig".to_string(),
            )),
        }
    }

    fn apply_env_overrides(
        mut settings: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, EnomError> {
        let env_mappings = [
            ("ENOM_USERNAME", "username"),
            ("ENOM_PASSWORD", "password"),
            ("ENOM_TEST", "test_mode"),
            ("ENOM_PROXY_ADDR", "proxy.addr"),
            ("ENOM_PROXY_PORT", "proxy.port"),
            ("ENOM_PROXY_USER", "proxy.user"),
            ("ENOM_PROXY_PASS", "proxy.pass"),
            ("ENOM_TIMEOUT_SECONDS", "timeout_seconds"),
            ("ENOM_ENDPOINT", "endpoint"),
        ];

        for (env_var, config_key) in env_mappings {
            if let Ok(value) = std::env::var(env_var) {
                settings = settings.set_override(config_key, value)?;
            }
        }

        Ok(settings)
    }

    fn apply_cli_overrides(
        mut settings: config::ConfigBuilder<config::builder::DefaultState>,
        overrides: &ConfigOverrides,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, EnomError> {
        if let Some(username) = &overrides.username {
            settings = settings.set_override("username", username.as_str())?;
        }
        if let Some(password) = &overrides.password {
            settings = settings.set_override("password", password.as_str())?;
        }
        if overrides.test_mode {
            settings = settings.set_override("test_mode", true)?;
        }
        if let Some(addr) = &overrides.proxy_addr {
            settings = settings.set_override("proxy.addr", addr.as_str())?;
        }
        if let Some(port) = overrides.proxy_port {
            settings = settings.set_override("proxy.port", port as i64)?;
        }
        if let Some(user) = &overrides.proxy_user {
            settings = settings.set_override("proxy.user", user.as_str())?;
        }
        if let Some(pass) = &overrides.proxy_pass {
            settings = settings.set_override("proxy.pass", pass.as_str())?;
        }
        Ok(settings)
    }
}
