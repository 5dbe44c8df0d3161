use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Required state is missing: {0}")]
    InvalidState(String),

    #[error("Authentication failure: {0}")]
    Authentication(String),

    #[error("Groups system failure: {0}")]
    Groups(String),

    #[error("Invalid portal configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for PortalError {
    fn from(error: serde_json::Error) -> Self {
        PortalError::Groups(format!("group store document: {error}"))
    }
}

impl From<std::io::Error> for PortalError {
    fn from(error: std::io::Error) -> Self {
        PortalError::Groups(format!("group store file: {error}"))
    }
}
