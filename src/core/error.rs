/*!
Error handling for the TNCCS session layer.

Every fallible operation in the crate returns [`Result`]. Errors raised by the
underlying secure transport are carried in [`Error::Transport`] without being
reinterpreted, and every error maps onto a TNC result code so it can cross
the IMC/IMV callback boundary.
*/

use std::io;
use thiserror::Error;

use crate::core::constants::result_codes;
use crate::core::types::{Role, TnccsType, TransportType};

/// Result type for the TNCCS session layer
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the TNCCS session layer
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument was malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The session was closed; nothing further is accepted
    #[error("Session terminated")]
    SessionTerminated,

    /// No implementation is registered for the requested combination
    #[error("Unsupported configuration: no {variant} implementation for {role} over {transport}")]
    UnsupportedConfiguration {
        role: Role,
        transport: TransportType,
        variant: TnccsType,
    },

    /// Failure reported by the underlying secure transport
    #[error("Transport failure: {0}")]
    Transport(#[source] io::Error),

    /// Operation not allowed in the current session state
    #[error("Session not in correct state: expected {expected}, but was {actual}")]
    InvalidState {
        expected: String,
        actual: String,
    },

    /// Inbound batch could not be parsed
    #[error("Invalid batch format: {0}")]
    InvalidFormat(String),

    /// Peer violated the batch protocol
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// TNC result code as defined by the IF-IMC/IF-IMV C API
pub type TncResult = u32;

impl Error {
    /// Map this error onto the TNC result code reported to IMC/IMV callers
    pub fn result_code(&self) -> TncResult {
        match self {
            Error::InvalidArgument(_) => result_codes::INVALID_PARAMETER,
            Error::SessionTerminated => result_codes::ILLEGAL_OPERATION,
            Error::UnsupportedConfiguration { .. } => result_codes::NO_COMMON_VERSION,
            Error::Transport(_) => result_codes::FATAL,
            Error::InvalidState { .. } => result_codes::ILLEGAL_OPERATION,
            Error::InvalidFormat(_) | Error::Protocol(_) => result_codes::OTHER,
        }
    }

    /// Whether the error ends the session when raised on the inbound path
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::InvalidFormat(_)
                | Error::Protocol(_)
                | Error::UnsupportedConfiguration { .. }
        )
    }
}

/// Create an invalid argument error
#[macro_export]
macro_rules! invalid_argument_err {
    ($msg:expr) => {
        Err($crate::core::error::Error::InvalidArgument($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::core::error::Error::InvalidArgument(format!($fmt, $($arg)*)))
    };
}

/// Create a protocol error
#[macro_export]
macro_rules! protocol_err {
    ($msg:expr) => {
        Err($crate::core::error::Error::Protocol($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::core::error::Error::Protocol(format!($fmt, $($arg)*)))
    };
}

/// Create a batch format error
#[macro_export]
macro_rules! format_err {
    ($msg:expr) => {
        Err($crate::core::error::Error::InvalidFormat($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::core::error::Error::InvalidFormat(format!($fmt, $($arg)*)))
    };
}

/// Create an invalid state error
#[macro_export]
macro_rules! invalid_state_err {
    ($expected:expr, $actual:expr) => {
        Err($crate::core::error::Error::InvalidState {
            expected: $expected.to_string(),
            actual: $actual.to_string(),
        })
    };
}

/// Convert from Error to io::Error (for carriers built on std::io)
impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Transport(io_error) => io_error,
            Error::InvalidArgument(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            Error::SessionTerminated => {
                io::Error::new(io::ErrorKind::NotConnected, "Session terminated")
            }
            err @ Error::UnsupportedConfiguration { .. } => {
                io::Error::new(io::ErrorKind::Unsupported, err.to_string())
            }
            err @ Error::InvalidState { .. } => io::Error::other(err.to_string()),
            Error::InvalidFormat(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
            Error::Protocol(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidArgument("bad length".to_string());
        assert_eq!(format!("{}", err), "Invalid argument: bad length");

        let err = Error::SessionTerminated;
        assert_eq!(format!("{}", err), "Session terminated");

        let err = Error::UnsupportedConfiguration {
            role: Role::Requestor,
            transport: TransportType::Tls1_0,
            variant: TnccsType::Soh,
        };
        assert_eq!(
            format!("{}", err),
            "Unsupported configuration: no TNCCS-SOH implementation for TNC Client over TLS 1.0"
        );
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(
            Error::InvalidArgument(String::new()).result_code(),
            result_codes::INVALID_PARAMETER
        );
        assert_eq!(Error::SessionTerminated.result_code(), result_codes::ILLEGAL_OPERATION);
        assert_eq!(
            Error::Transport(io::Error::from(io::ErrorKind::BrokenPipe)).result_code(),
            result_codes::FATAL
        );
        assert_eq!(Error::Protocol(String::new()).result_code(), result_codes::OTHER);
    }

    #[test]
    fn test_transport_error_round_trips_unchanged() {
        let original = io::Error::new(io::ErrorKind::ConnectionReset, "peer reset");
        let err = Error::Transport(original);
        let io_err = io::Error::from(err);

        assert_eq!(io_err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(io_err.to_string(), "peer reset");
    }

    #[test]
    fn test_macros() {
        let r: Result<()> = invalid_argument_err!("length {} != {}", 3, 4);
        assert!(matches!(r, Err(Error::InvalidArgument(ref m)) if m == "length 3 != 4"));

        let r: Result<()> = invalid_state_err!("variant-selected", "established");
        assert!(matches!(r, Err(Error::InvalidState { .. })));
    }
}
