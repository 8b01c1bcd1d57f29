use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported URL: {0}")]
    UnsupportedPlatform(String),

    #[error("parsing error: {0}")]
    Parsing(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("API error: {status}: {message}")]
    Api { status: u16, message: String },

    #[error("could not resolve {platform} content: every extraction method failed")]
    Exhausted { platform: &'static str },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
