//! Swarm error types

use crate::shutdown::ShutdownError;
use stampede_http::HttpError;
use stampede_session::SessionError;
use thiserror::Error;

pub type SwarmResult<T> = Result<T, SwarmError>;

#[derive(Error, Debug)]
pub enum SwarmError {
    #[error("Session setup failed: {0}")]
    Session(#[from] SessionError),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] HttpError),

    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}
