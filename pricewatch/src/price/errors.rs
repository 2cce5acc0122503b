use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("price feed returned no data")]
    EmptyResponse,

    #[error("price feed unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("price feed answered with status {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid response from price feed: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status)
        } else {
            FetchError::Unreachable(e)
        }
    }
}
