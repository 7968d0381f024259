//! Input report decoding for the USB report transport.
//!
//! Every input report is exactly [`REPORT_PACKET_SIZE`] bytes. Byte 0 declares
//! how far into the packet the barcode extends, bytes 1..=3 carry the
//! symbology type code and the payload starts at byte 4.
//!
//! ```
//! use scanport_core::SymbologyCode;
//! use scanport_protocol::{RejectReason, decode_report_packet, encode_report_packet};
//!
//! let raw = encode_report_packet(b"ABC-123", SymbologyCode::CODE128);
//! let packet = decode_report_packet(&raw).unwrap();
//! assert_eq!(packet.payload(), Some(&b"ABC-123"[..]));
//! assert_eq!(packet.symbology(), SymbologyCode::CODE128);
//!
//! assert_eq!(
//!     decode_report_packet(&raw[..10]),
//!     Err(RejectReason::TooShort { len: 10 })
//! );
//! ```

use bytes::Bytes;
use scanport_core::{
    SymbologyCode,
    constants::{REPORT_HEADER_SIZE, REPORT_PACKET_SIZE, REPORT_PAYLOAD_CAPACITY},
};

use crate::error::RejectReason;

/// A decoded input report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPacket {
    declared_length: u8,
    status: [u8; 3],
    payload: Bytes,
}

impl ReportPacket {
    /// Length byte as sent by the scanner.
    pub fn declared_length(&self) -> u8 {
        self.declared_length
    }

    /// Raw status bytes 1..=3.
    pub fn status_bytes(&self) -> [u8; 3] {
        self.status
    }

    /// Symbology type code embedded in the status bytes.
    pub fn symbology(&self) -> SymbologyCode {
        SymbologyCode::from_le_bytes(self.status)
    }

    /// Barcode bytes, or `None` for a status-only report.
    pub fn payload(&self) -> Option<&[u8]> {
        if self.payload.is_empty() {
            None
        } else {
            Some(&self.payload[..])
        }
    }

    /// Consume the packet, returning the payload bytes (empty when status-only).
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn is_status_only(&self) -> bool {
        self.payload.is_empty()
    }

    /// The length byte pointed past the end of the packet.
    ///
    /// Such reports are treated as status-only.
    pub fn length_overflow(&self) -> bool {
        usize::from(self.declared_length) > REPORT_PACKET_SIZE
    }
}

/// Decode one input report.
///
/// Only the first [`REPORT_PACKET_SIZE`] bytes of a longer buffer are looked at.
///
/// # Errors
///
/// Returns [`RejectReason::TooShort`] for buffers shorter than a full report.
/// Nothing past the length check is interpreted in that case.
pub fn decode_report_packet(buffer: &[u8]) -> Result<ReportPacket, RejectReason> {
    if buffer.len() < REPORT_PACKET_SIZE {
        return Err(RejectReason::TooShort { len: buffer.len() });
    }
    let packet = &buffer[..REPORT_PACKET_SIZE];

    let declared_length = packet[0];
    let status = [packet[1], packet[2], packet[3]];
    let end = usize::from(declared_length);

    let payload = if end > REPORT_HEADER_SIZE && end <= REPORT_PACKET_SIZE {
        Bytes::copy_from_slice(&packet[REPORT_HEADER_SIZE..end])
    } else {
        Bytes::new()
    };

    Ok(ReportPacket {
        declared_length,
        status,
        payload,
    })
}

/// Build an input report the way the scanner firmware lays it out.
///
/// Payload beyond [`REPORT_PAYLOAD_CAPACITY`] is cut off. Used by mock pipes and
/// emulators.
pub fn encode_report_packet(payload: &[u8], symbology: SymbologyCode) -> [u8; REPORT_PACKET_SIZE] {
    let mut packet = [0u8; REPORT_PACKET_SIZE];
    let len = payload.len().min(REPORT_PAYLOAD_CAPACITY);

    // len <= 60, so the declared length always fits in the packet
    packet[0] = (REPORT_HEADER_SIZE + len) as u8;
    packet[1..REPORT_HEADER_SIZE].copy_from_slice(&symbology.to_le_bytes());
    packet[REPORT_HEADER_SIZE..REPORT_HEADER_SIZE + len].copy_from_slice(&payload[..len]);
    packet
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn report_with_length(declared: u8) -> [u8; REPORT_PACKET_SIZE] {
        let mut raw = [b'X'; REPORT_PACKET_SIZE];
        raw[0] = declared;
        raw[1..4].copy_from_slice(&[0x00, 0x0C, 0x0B]);
        raw
    }

    #[test]
    fn test_decode_full_payload() {
        let raw = report_with_length(64);
        let packet = decode_report_packet(&raw).unwrap();
        assert_eq!(packet.payload().map(<[u8]>::len), Some(REPORT_PAYLOAD_CAPACITY));
        assert_eq!(packet.symbology(), SymbologyCode::EAN13);
        assert!(!packet.length_overflow());
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(4)]
    fn test_decode_status_only(#[case] declared: u8) {
        let packet = decode_report_packet(&report_with_length(declared)).unwrap();
        assert!(packet.is_status_only());
        assert_eq!(packet.payload(), None);
        assert_eq!(packet.status_bytes(), [0x00, 0x0C, 0x0B]);
    }

    #[rstest]
    #[case(65)]
    #[case(200)]
    #[case(255)]
    fn test_decode_length_past_packet_is_status_only(#[case] declared: u8) {
        let packet = decode_report_packet(&report_with_length(declared)).unwrap();
        assert!(packet.is_status_only());
        assert!(packet.length_overflow());
    }

    #[test]
    fn test_decode_single_payload_byte() {
        let mut raw = report_with_length(5);
        raw[4] = b'7';
        let packet = decode_report_packet(&raw).unwrap();
        assert_eq!(packet.payload(), Some(&b"7"[..]));
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let raw = report_with_length(10);
        assert_eq!(
            decode_report_packet(&raw[..63]),
            Err(RejectReason::TooShort { len: 63 })
        );
        assert_eq!(
            decode_report_packet(&[]),
            Err(RejectReason::TooShort { len: 0 })
        );
    }

    #[test]
    fn test_decode_ignores_bytes_past_packet() {
        let mut raw = vec![0u8; 128];
        raw[..REPORT_PACKET_SIZE].copy_from_slice(&encode_report_packet(b"12345", SymbologyCode::CODE39));
        raw[REPORT_PACKET_SIZE..].fill(0xFF);

        let packet = decode_report_packet(&raw).unwrap();
        assert_eq!(packet.payload(), Some(&b"12345"[..]));
        assert_eq!(packet.symbology(), SymbologyCode::CODE39);
    }

    #[test]
    fn test_encode_truncates_long_payload() {
        let payload = [b'9'; 80];
        let raw = encode_report_packet(&payload, SymbologyCode::GENERIC);
        assert_eq!(raw[0], 64);

        let packet = decode_report_packet(&raw).unwrap();
        assert_eq!(packet.into_payload().len(), REPORT_PAYLOAD_CAPACITY);
    }
}
