use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The completion endpoint failed or returned something unusable.
    #[error(transparent)]
    Gateway(#[from] gateway::Error),

    /// The model broke the two-phase protocol, e.g. requested more
    /// tools on the followup call.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, Error>;
