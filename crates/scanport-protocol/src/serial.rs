//! Single-shot serial frame extraction.
//!
//! A serial frame is the first run of bytes that starts at a printable ASCII
//! byte and ends just before a CR, LF or NUL. Anything the window holds after
//! the terminator, and any run that never terminates, is discarded. See
//! [`FrameAccumulator`](crate::FrameAccumulator) for the variant that keeps
//! partial runs across reads.

use bytes::Bytes;
use scanport_core::constants::SERIAL_MAX_FRAME_LENGTH;
use std::fmt;

/// First byte of the printable ASCII range.
pub const PRINTABLE_MIN: u8 = 0x20;

/// Last byte of the printable ASCII range.
pub const PRINTABLE_MAX: u8 = 0x7E;

#[inline]
pub(crate) fn is_printable(byte: u8) -> bool {
    (PRINTABLE_MIN..=PRINTABLE_MAX).contains(&byte)
}

#[inline]
pub(crate) fn is_terminator(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n' | 0)
}

/// A delimiter-terminated serial frame, terminator excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerialFrame {
    bytes: Bytes,
}

impl SerialFrame {
    /// Wrap captured bytes, cutting them to the capture bound.
    pub(crate) fn from_capture(capture: &[u8]) -> Self {
        let len = capture.len().min(SERIAL_MAX_FRAME_LENGTH);
        Self {
            bytes: Bytes::copy_from_slice(&capture[..len]),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Frame contents as text, if they are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Frame contents followed by a NUL terminator.
    pub fn as_c_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bytes.len() + 1);
        out.extend_from_slice(&self.bytes);
        out.push(0);
        out
    }
}

impl fmt::Display for SerialFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

/// Extract the first terminated frame from a raw read window.
///
/// Returns `None` when the window holds no printable byte, when the run that
/// starts there is never terminated, or when the result would be empty. The
/// call has no state; running it twice on the same window gives the same
/// answer.
///
/// ```
/// use scanport_protocol::decode_serial_frame;
///
/// let frame = decode_serial_frame(b"\x00\x00OK1234567890\r\n").unwrap();
/// assert_eq!(frame.as_str(), Some("OK1234567890"));
///
/// assert!(decode_serial_frame(b"no terminator").is_none());
/// assert!(decode_serial_frame(b"\x01\x02\x03").is_none());
/// ```
pub fn decode_serial_frame(raw: &[u8]) -> Option<SerialFrame> {
    let start = raw.iter().position(|&b| is_printable(b))?;
    let end = start + 1 + raw[start + 1..].iter().position(|&b| is_terminator(b))?;

    let frame = SerialFrame::from_capture(&raw[start..end]);
    (!frame.is_empty()).then_some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"OK1234567890\r\n", "OK1234567890")]
    #[case(b"\r\n4006381333931\r", "4006381333931")]
    #[case(b"\x05\x06ABC\x00garbage", "ABC")]
    #[case(b"first\nsecond\n", "first")]
    #[case(b" leading space\n", " leading space")]
    fn test_decode_terminated_frames(#[case] raw: &[u8], #[case] expected: &str) {
        let frame = decode_serial_frame(raw).unwrap();
        assert_eq!(frame.as_str(), Some(expected));
    }

    #[rstest]
    #[case(b"")]
    #[case(b"\r\n\r\n")]
    #[case(b"\x01\x02\x7F\xFF")]
    #[case(b"unterminated")]
    #[case(b"\x00\x00partial")]
    fn test_decode_rejects_window(#[case] raw: &[u8]) {
        assert!(decode_serial_frame(raw).is_none());
        assert!(decode_serial_frame(raw).is_none());
    }

    #[test]
    fn test_decode_keeps_inner_control_bytes() {
        let frame = decode_serial_frame(b"AB\x01\x7FCD\r").unwrap();
        assert_eq!(frame.as_bytes(), b"AB\x01\x7FCD");
    }

    #[test]
    fn test_decode_truncates_to_capture_bound() {
        let mut raw = vec![b'A'; 300];
        raw.push(b'\n');
        let frame = decode_serial_frame(&raw).unwrap();
        assert_eq!(frame.len(), SERIAL_MAX_FRAME_LENGTH);
    }

    #[test]
    fn test_c_bytes_are_nul_terminated() {
        let frame = decode_serial_frame(b"XYZ\n").unwrap();
        assert_eq!(frame.as_c_bytes(), b"XYZ\0");
        assert_eq!(frame.to_string(), "XYZ");
    }
}
