//! Startup errors.

use roomchat_transport::TransportError;
use std::io;
use thiserror::Error;

/// Errors that stop the client before a session starts.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Reading the identity from the terminal failed.
    #[error("failed to read {field}: {source}")]
    Prompt {
        /// Which prompt was being answered.
        field: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Terminal setup or teardown failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),

    /// The server could not be reached.
    #[error(transparent)]
    Connect(#[from] TransportError),
}
