use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Browser session lost: {0}")]
    SessionLost(String),

    #[error(transparent)]
    Core(#[from] outreach_core::Error),
}

impl Error {
    /// Only a lost session ends the run; everything else is recovered
    /// into a per-target failure record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::SessionLost(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
