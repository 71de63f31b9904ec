use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartgrabError {
    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CartgrabError>;
