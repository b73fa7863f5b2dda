//! Network error types

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Socket setup failed: {0}")]
    Socket(#[from] io::Error),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid network config: {0}")]
    InvalidConfig(String),

    #[error("Ingress runtime error: {0}")]
    Runtime(String),
}

pub type NetResult<T> = Result<T, NetError>;
