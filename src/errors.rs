use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnomError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Interface error: {0}")]
    InterfaceError(String),

    #[error("Invalid name server count: {0} (must be between 2 and 12)")]
    InvalidNameServerCount(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl EnomError {
    /// The registrar-level failures the CLI reports as plain messages.
    pub fn is_registrar_error(&self) -> bool {
        matches!(
            self,
            EnomError::CommandNotFound(_)
                | EnomError::InvalidCredentials(_)
                | EnomError::InterfaceError(_)
        )
    }
}

impl From<quick_xml::Error> for EnomError {
    fn from(e: quick_xml::Error) -> Self {
        EnomError::Xml(e.to_string())
    }
}
