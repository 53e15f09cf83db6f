use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid response body: {0}")]
    Parse(String),

    #[error("failed to build request: {0}")]
    RequestBuild(String),
}

impl From<reqwest::Error> for RestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return RestError::Timeout;
        }
        if err.is_decode() {
            return RestError::Parse(err.to_string());
        }
        if err.is_builder() {
            return RestError::RequestBuild(err.to_string());
        }
        match err.status() {
            Some(status) => RestError::HttpError {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => RestError::Connection(err.to_string()),
        }
    }
}
