use scanport_core::constants::{REPORT_PACKET_SIZE, SERIAL_MAX_FRAME_LENGTH};
use thiserror::Error;

/// Reason a chunk of inbound bytes was rejected by the codec.
///
/// Rejections are expected on a noisy line. Backends count and log them; they
/// never propagate as hard failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("Report too short: {len} bytes (expected {REPORT_PACKET_SIZE})")]
    TooShort { len: usize },

    #[error("No terminated frame in {len} bytes")]
    NoFrame { len: usize },

    #[error("Frame exceeded {SERIAL_MAX_FRAME_LENGTH} bytes without a terminator")]
    FrameOverflow,
}

/// Errors surfaced by [`SerialFrameCodec`](crate::SerialFrameCodec).
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error(transparent)]
    Rejected(#[from] RejectReason),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_display() {
        assert_eq!(
            RejectReason::TooShort { len: 12 }.to_string(),
            "Report too short: 12 bytes (expected 64)"
        );
        assert_eq!(
            RejectReason::FrameOverflow.to_string(),
            "Frame exceeded 255 bytes without a terminator"
        );
    }

    #[test]
    fn test_protocol_error_wraps_io() {
        let err = ProtocolError::from(std::io::Error::other("port gone"));
        assert!(err.to_string().contains("port gone"));
    }
}
