use std::net::{AddrParseError, IpAddr};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataplaneError>;

#[derive(Error, Debug)]
pub enum DataplaneError {
    #[error(transparent)]
    Status(#[from] StatusError),

    #[error("dataplane transport error: {0}")]
    Transport(#[from] tonic::Status),

    #[error("error parsing {field} {value:?}: {source}")]
    Parse {
        field: &'static str,
        value: String,
        #[source]
        source: AddrParseError,
    },

    #[error("{field} {address} does not match ip version tag {ip_version}")]
    IpVersionMismatch {
        field: &'static str,
        address: IpAddr,
        ip_version: i32,
    },

    #[error("invalid prefix length {length} for address {address}")]
    InvalidPrefixLength { address: IpAddr, length: u32 },

    #[error("dataplane response is missing {0}")]
    MissingField(&'static str),
}

impl DataplaneError {
    /// Backend status code, if the dataplane answered with one
    pub fn status_code(&self) -> Option<u32> {
        match self {
            DataplaneError::Status(status) => Some(status.code()),
            _ => None,
        }
    }
}

/// A call that reached the dataplane but was refused with a non-zero code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[error code {code}] {message}")]
pub struct StatusError {
    code: u32,
    message: String,
}

impl StatusError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
