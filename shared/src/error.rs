//! Fatal error taxonomy shared by both binaries.
//!
//! Only the faults the design treats as unrecoverable surface here; late
//! input, early batches, stale adjustments and unknown packet types are
//! handled inline in the packet loop and never become a `NetcodeError`.

use std::net::AddrParseError;

#[derive(Debug, thiserror::Error)]
pub enum NetcodeError {
    #[error("failed to bind socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddrParseError),

    #[error("could not resolve address {0}")]
    UnresolvedAddress(String),

    #[error("no response from server within the connection timeout")]
    ConnectionTimedOut,

    #[error("socket i/o error: {0}")]
    Io(#[from] std::io::Error),
}
