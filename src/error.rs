//! Error type shared by the connection, the transports and the handles

use crate::protocol::{DecodeError, EncodeError, ProtocolError, ResourceId};
use crate::resources::ResourceKind;
use std::fmt;
use std::io;

/// Errors surfaced synchronously to the caller
///
/// Server-side errors for fire-and-forget requests are not reported here;
/// they arrive later as [`crate::Event::Error`].
#[derive(Debug)]
pub enum Error {
    /// The transport could not establish a session
    ConnectFailed(String),
    /// The server speaks a protocol version other than 11
    ProtocolVersionMismatch { major: u16, minor: u16 },
    /// The transport failed mid-session, or the connection was closed
    ConnectionLost,
    /// Error packet answering a request the client waited on
    Protocol(ProtocolError),
    /// Malformed or truncated record from the server
    Decode(DecodeError),
    /// Request does not fit the core protocol length field
    Encode(EncodeError),
    /// Text drawn through a graphics context with no font bound
    FontNotSet,
    /// The client's resource id range is used up
    IdsExhausted,
    /// Operation on a handle that has already been released
    Released { kind: ResourceKind, id: ResourceId },
    Io(io::Error),
}

/// Result type for façade operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error means the connection can no longer be used
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Error::ConnectionLost | Error::Io(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConnectFailed(reason) => write!(f, "Failed to connect: {}", reason),
            Error::ProtocolVersionMismatch { major, minor } => write!(
                f,
                "Unsupported protocol version {}.{} (expected 11.0)",
                major, minor
            ),
            Error::ConnectionLost => write!(f, "Connection to the X server lost"),
            Error::Protocol(err) => write!(f, "{}", err),
            Error::Decode(err) => write!(f, "Decode error: {}", err),
            Error::Encode(err) => write!(f, "Encode error: {}", err),
            Error::FontNotSet => write!(f, "No font set on graphics context"),
            Error::IdsExhausted => write!(f, "Resource id range exhausted"),
            Error::Released { kind, id } => write!(f, "{} {} already released", kind, id),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(err) => Some(err),
            Error::Encode(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Error::Encode(err)
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Error::Protocol(err)
    }
}
