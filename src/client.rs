use crate::{config::Config, errors::EnomError, parser::XmlParser, response::Response};
use async_trait::async_trait;
use serde_json::Value;
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, info, warn};
use url::Url;

/// Ordered command parameters. Setting an existing key replaces its value
/// in place, so later writes win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn command(command: &str) -> Self {
        Self::new().with("Command", command)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn merge(mut self, other: Params) -> Self {
        for (key, value) in other.0 {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

/// Sends one command to the registrar and returns the parsed body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, params: &Params) -> Result<Value, EnomError>;
}

/// `Transport` over HTTPS with `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    username: String,
    password: String,
    parser: XmlParser,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, EnomError> {
        let (username, password) = config.credentials()?;
        let endpoint = config.endpoint_url()?;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("enom/", env!("CARGO_PKG_VERSION")))
            .gzip(true);

        if let Some(proxy_config) = &config.proxy {
            let mut proxy = reqwest::Proxy::all(proxy_config.url())?;
            if let Some(user) = &proxy_config.user {
                proxy = proxy.basic_auth(user, proxy_config.pass.as_deref().unwrap_or(""));
            }
            info!("Routing registrar requests through proxy {}", proxy_config.url());
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            username: username.to_string(),
            password: password.to_string(),
            parser: XmlParser::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, params: &Params) -> Result<Value, EnomError> {
        let command = params.get("Command").unwrap_or("<none>");
        debug!("Enom {} -> {}", command, self.endpoint);

        let query = params
            .clone()
            .with("UID", &self.username)
            .with("PW", &self.password)
            .with("ResponseType", "XML");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&query.0)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("Enom {} response status: {} ({} bytes)", command, status, body.len());

        if !status.is_success() {
            warn!("Enom {} returned HTTP {}", command, status);
            return Err(EnomError::InterfaceError(format!("HTTP {} from registrar", status)));
        }

        self.parser.parse(&body)
    }
}

/// Cheap, cloneable handle the domain model issues commands through.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Client over HTTP with the given configuration.
    pub fn new(config: &Config) -> Result<Self, EnomError> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Issue a command. Fails with `InterfaceError` when the body has no
    /// `interface_response`.
    pub async fn request(&self, params: Params) -> Result<Response, EnomError> {
        let body = self.transport.request(&params).await?;
        Response::new(body)
    }
}
