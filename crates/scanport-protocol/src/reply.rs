use bytes::Bytes;
use scanport_core::constants::{SERIAL_DATA_PREFIX, SERIAL_REPLY_ACK, SERIAL_REPLY_NAK};

use crate::serial::SerialFrame;

/// Meaning of a decoded serial frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialReply {
    /// Scanner accepted the last command.
    Ack,

    /// Scanner refused the last command.
    Nak,

    /// `DATA:`-prefixed reply, prefix stripped.
    Data(Bytes),

    /// Any other frame is a barcode.
    Barcode(Bytes),
}

impl SerialReply {
    /// Classify a frame by its contents.
    ///
    /// ```
    /// use scanport_protocol::{SerialReply, decode_serial_frame};
    ///
    /// let frame = decode_serial_frame(b"ACK\r\n").unwrap();
    /// assert_eq!(SerialReply::classify(&frame), SerialReply::Ack);
    ///
    /// let frame = decode_serial_frame(b"DATA:0042\r\n").unwrap();
    /// assert_eq!(SerialReply::classify(&frame).payload(), Some(&b"0042"[..]));
    /// ```
    pub fn classify(frame: &SerialFrame) -> Self {
        let bytes = frame.as_bytes();

        if bytes == SERIAL_REPLY_ACK.as_bytes() {
            SerialReply::Ack
        } else if bytes == SERIAL_REPLY_NAK.as_bytes() {
            SerialReply::Nak
        } else if let Some(rest) = bytes.strip_prefix(SERIAL_DATA_PREFIX.as_bytes()) {
            SerialReply::Data(Bytes::copy_from_slice(rest))
        } else {
            SerialReply::Barcode(frame.clone().into_bytes())
        }
    }

    /// Bytes to forward to the host, if any.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            SerialReply::Data(bytes) | SerialReply::Barcode(bytes) if !bytes.is_empty() => {
                Some(bytes.as_ref())
            }
            _ => None,
        }
    }

    /// ACK or NAK.
    pub fn is_acknowledgement(&self) -> bool {
        matches!(self, SerialReply::Ack | SerialReply::Nak)
    }
}
