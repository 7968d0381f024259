//! Error types for scanner transport operations.
//!
//! Errors fall into five categories (see [`ErrorCategory`]). Configuration,
//! unsupported-transport and connection errors are fatal to `initialize` and
//! surface to the caller. I/O errors fail one attempt and leave the backend in
//! its prior state. Parse errors never surface from the backends; they are
//! logged and counted in the statistics.

use scanport_core::{ConnectionState, Transport};
use scanport_protocol::RejectReason;

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, ScannerError>;

/// Errors that can occur while driving a scanner.
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// Configuration violates an invariant.
    #[error("Configuration error: {0}")]
    Configuration(#[from] scanport_core::Error),

    /// Selected transport is not compiled into this build.
    #[error("Transport not supported in this build: {transport}")]
    UnsupportedTransport { transport: Transport },

    /// Opening or configuring the connection failed.
    #[error("Connection to {target} failed: {message}")]
    Connection { target: String, message: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    Communication { message: String },

    /// Command does not fit the transport's command buffer.
    #[error("Command too long: {len} bytes (limit {limit})")]
    CommandTooLong { len: usize, limit: usize },

    /// Operation not valid in the backend's current state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: ConnectionState,
    },

    /// No backend is bound.
    #[error("Scanner not initialized")]
    NotInitialized,

    /// Inbound data was rejected by the codec.
    #[error("Rejected data: {0}")]
    Rejected(#[from] RejectReason),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`ScannerError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    TransportUnavailable,
    Connection,
    Io,
    Parse,
}

impl ScannerError {
    /// Create a new connection error.
    pub fn connection(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Timeout error for `duration`, saturating at `u64::MAX` milliseconds.
    pub fn timeout_after(duration: std::time::Duration) -> Self {
        Self::timeout(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    /// Create a new unsupported transport error.
    pub fn unsupported(transport: Transport) -> Self {
        Self::UnsupportedTransport { transport }
    }

    /// Create a new invalid state error.
    pub fn invalid_state(operation: &'static str, state: ConnectionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Reword an open failure as a connection error for `target`.
    ///
    /// Errors that already carry a fatal category are kept as they are.
    pub fn into_connection(self, target: &str) -> Self {
        match self {
            Self::Connection { .. } | Self::UnsupportedTransport { .. } | Self::Configuration(_) => {
                self
            }
            other => Self::connection(target, other.to_string()),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::UnsupportedTransport { .. } => ErrorCategory::TransportUnavailable,
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Rejected(_) => ErrorCategory::Parse,
            Self::Timeout { .. }
            | Self::Disconnected { .. }
            | Self::Communication { .. }
            | Self::CommandTooLong { .. }
            | Self::InvalidState { .. }
            | Self::NotInitialized
            | Self::Io(_) => ErrorCategory::Io,
        }
    }

    /// The attempt ran out of time. Not counted as an error by the poll cycle.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }

    /// Fatal to `initialize`.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration
                | ErrorCategory::TransportUnavailable
                | ErrorCategory::Connection
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_connection_error() {
        let error = ScannerError::connection("COM3", "access denied");
        assert!(matches!(error, ScannerError::Connection { .. }));
        assert_eq!(error.to_string(), "Connection to COM3 failed: access denied");
        assert_eq!(error.category(), ErrorCategory::Connection);
    }

    #[test]
    fn test_timeout_error() {
        let error = ScannerError::timeout(1000);
        assert_eq!(error.to_string(), "Operation timeout after 1000ms");
        assert!(error.is_timeout());
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_timeout_after_saturates() {
        let error = ScannerError::timeout_after(std::time::Duration::from_millis(250));
        assert!(matches!(error, ScannerError::Timeout { duration_ms: 250 }));

        let error = ScannerError::timeout_after(std::time::Duration::MAX);
        assert!(matches!(error, ScannerError::Timeout { duration_ms: u64::MAX }));
    }

    #[test]
    fn test_io_timed_out_is_timeout() {
        let error = ScannerError::from(std::io::Error::from(std::io::ErrorKind::TimedOut));
        assert!(error.is_timeout());
    }

    #[test]
    fn test_invalid_state_display() {
        let error = ScannerError::invalid_state("start", ConnectionState::Faulted);
        assert_eq!(error.to_string(), "Cannot start while Faulted");
    }

    #[test]
    fn test_into_connection_keeps_fatal_errors() {
        let unsupported = ScannerError::unsupported(Transport::Serial).into_connection("COM1");
        assert_eq!(unsupported.category(), ErrorCategory::TransportUnavailable);

        let wrapped = ScannerError::disconnected("hid").into_connection("report pipe");
        assert_eq!(wrapped.category(), ErrorCategory::Connection);
        assert!(wrapped.to_string().contains("Device disconnected: hid"));
    }

    #[rstest]
    #[case(ScannerError::Configuration(scanport_core::Error::InvalidPortNumber(0)), ErrorCategory::Configuration)]
    #[case(ScannerError::unsupported(Transport::Report), ErrorCategory::TransportUnavailable)]
    #[case(ScannerError::CommandTooLong { len: 12, limit: 11 }, ErrorCategory::Io)]
    #[case(ScannerError::NotInitialized, ErrorCategory::Io)]
    #[case(ScannerError::Rejected(RejectReason::TooShort { len: 3 }), ErrorCategory::Parse)]
    fn test_error_categories(#[case] error: ScannerError, #[case] expected: ErrorCategory) {
        assert_eq!(error.category(), expected);
    }
}
