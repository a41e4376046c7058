use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] ureq::Error),
    #[error("io error reading response body: {0}")]
    Body(#[from] std::io::Error),
    #[error("response from {0} is missing the {1} header")]
    MissingFingerprint(String, String),
    #[error("could not get {url} [status code={status}]")]
    GetFailed { url: String, status: u16 },
    #[error("could not post config to Go server ({url}) [status code={status}]:\n{message}")]
    PostRejected {
        url: String,
        status: u16,
        message: String,
    },
}

impl From<ClientError> for gocd_config::ConfigError {
    fn from(error: ClientError) -> Self {
        gocd_config::ConfigError::Transport(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
