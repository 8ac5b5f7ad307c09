use thiserror::Error;

/// Why a search did not produce a link. Logged, never returned to the pipeline.
#[derive(Debug, Error)]
pub enum ResolutionFailure {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("search returned HTTP {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),

    #[error("no result link in response")]
    NoMatch,
}

impl ResolutionFailure {
    /// Worth another attempt when retries are enabled.
    pub fn is_transient(&self) -> bool {
        match self {
            ResolutionFailure::Transport(_) | ResolutionFailure::Body(_) => true,
            ResolutionFailure::Status(code) => *code == 429 || *code >= 500,
            ResolutionFailure::NoMatch => false,
        }
    }
}

impl From<ureq::Error> for ResolutionFailure {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => ResolutionFailure::Status(code),
            ureq::Error::Transport(transport) => ResolutionFailure::Transport(transport.to_string()),
        }
    }
}
