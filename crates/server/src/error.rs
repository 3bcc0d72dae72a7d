//! Server errors.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("cannot bind {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Host and port do not form a socket address.
    #[error("invalid listen address {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ServerError {
    pub fn bind(address: impl Into<String>, source: io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }
}
