//! Core constants for the scanner transport protocols.
//!
//! This module defines every wire-level constant shared by the codec and the
//! transport backends. Buffer sizes live here once so that each decode path can
//! check against the same named bound instead of trusting its caller.
//!
//! # Report Transport
//!
//! Input reports arrive over the USB interrupt pipe as fixed 64-byte packets:
//!
//! ```text
//! ┌────────┬──────────┬──────────┬──────────┬──────────────────────────┐
//! │ Byte 0 │ Byte 1   │ Byte 2   │ Byte 3   │ Bytes 4..64              │
//! │ length │ status 0 │ status 1 │ status 2 │ barcode payload (≤ 60)   │
//! └────────┴──────────┴──────────┴──────────┴──────────────────────────┘
//! ```
//!
//! Commands are sent as 11-byte output reports.
//!
//! # Serial Transport
//!
//! The serial link is a plain 9600-8-N-1 byte stream. Commands are ASCII verbs
//! terminated by CR/LF; barcodes arrive as printable ASCII runs terminated by
//! CR, LF or NUL.
//!
//! ```
//! use scanport_core::constants::*;
//!
//! assert_eq!(REPORT_HEADER_SIZE + REPORT_PAYLOAD_CAPACITY, REPORT_PACKET_SIZE);
//! assert_eq!(SERIAL_ENABLE_COMMAND, "ENABLE\r\n");
//! ```

// ============================================================================
// Report Transport Layout
// ============================================================================

/// Size of one input report from the scanner, in bytes.
///
/// Any buffer shorter than this is rejected before interpretation.
pub const REPORT_PACKET_SIZE: usize = 64;

/// Number of status bytes following the length byte.
///
/// The status bytes carry the 24-bit symbology type code, little-endian.
pub const REPORT_STATUS_SIZE: usize = 3;

/// Offset of the first payload byte (length byte + status bytes).
pub const REPORT_HEADER_SIZE: usize = 1 + REPORT_STATUS_SIZE;

/// Maximum barcode payload carried by a single report.
pub const REPORT_PAYLOAD_CAPACITY: usize = REPORT_PACKET_SIZE - REPORT_HEADER_SIZE;

/// Size of a command (output) report, in bytes.
///
/// Raw commands longer than this are rejected with `CommandTooLong`.
pub const REPORT_COMMAND_SIZE: usize = 11;

/// Size of the scanner status feature report, in bytes.
pub const REPORT_FEATURE_STATUS_SIZE: usize = 8;

/// HID report ID used by the scanner's application collection.
///
/// Prepended to output reports and stripped from input reports by platform
/// adapters that expose numbered reports.
pub const REPORT_ID: u8 = 1;

// ============================================================================
// Report Transport Commands
// ============================================================================

/// Opcode of the enable command (USB-OEM protocol).
pub const REPORT_ENABLE_OPCODE: u8 = 17;

/// Opcode of the disable command.
pub const REPORT_DISABLE_OPCODE: u8 = 18;

/// Opcode of the status request command.
pub const REPORT_STATUS_OPCODE: u8 = 19;

/// Enable command as sent over the report pipe: opcode 17 followed by ten
/// zero bytes.
///
/// ```
/// use scanport_core::constants::{REPORT_COMMAND_SIZE, REPORT_ENABLE_COMMAND};
///
/// assert_eq!(REPORT_ENABLE_COMMAND.len(), REPORT_COMMAND_SIZE);
/// assert_eq!(REPORT_ENABLE_COMMAND[0], 17);
/// assert!(REPORT_ENABLE_COMMAND[1..].iter().all(|&b| b == 0));
/// ```
pub const REPORT_ENABLE_COMMAND: [u8; REPORT_COMMAND_SIZE] =
    report_command(REPORT_ENABLE_OPCODE);

/// Disable command as sent over the report pipe.
pub const REPORT_DISABLE_COMMAND: [u8; REPORT_COMMAND_SIZE] =
    report_command(REPORT_DISABLE_OPCODE);

/// Status request command as sent over the report pipe.
pub const REPORT_STATUS_COMMAND: [u8; REPORT_COMMAND_SIZE] =
    report_command(REPORT_STATUS_OPCODE);

const fn report_command(opcode: u8) -> [u8; REPORT_COMMAND_SIZE] {
    let mut command = [0u8; REPORT_COMMAND_SIZE];
    command[0] = opcode;
    command
}

// ============================================================================
// Serial Transport
// ============================================================================

/// Capacity of the serial capture buffer, in bytes.
///
/// One byte is reserved for the NUL terminator, so a decoded frame carries at
/// most [`SERIAL_MAX_FRAME_LENGTH`] bytes.
pub const SERIAL_CAPTURE_CAPACITY: usize = 256;

/// Longest frame the serial decoder will capture.
pub const SERIAL_MAX_FRAME_LENGTH: usize = SERIAL_CAPTURE_CAPACITY - 1;

/// Serial line speed. Literal, not configurable.
pub const SERIAL_BAUD_RATE: u32 = 9600;

/// Serial data bits per character.
pub const SERIAL_DATA_BITS: u8 = 8;

/// Serial stop bits per character.
pub const SERIAL_STOP_BITS: u8 = 1;

/// Lowest valid serial port number.
pub const MIN_SERIAL_PORT: u8 = 1;

/// Highest valid serial port number.
pub const MAX_SERIAL_PORT: u8 = 255;

/// Serial enable command.
pub const SERIAL_ENABLE_COMMAND: &str = "ENABLE\r\n";

/// Serial disable command.
pub const SERIAL_DISABLE_COMMAND: &str = "DISABLE\r\n";

/// Serial status request command.
pub const SERIAL_STATUS_COMMAND: &str = "STATUS\r\n";

/// Positive acknowledgement reply from the scanner.
pub const SERIAL_REPLY_ACK: &str = "ACK";

/// Negative acknowledgement reply from the scanner.
pub const SERIAL_REPLY_NAK: &str = "NAK";

/// Prefix the scanner may put in front of data replies.
pub const SERIAL_DATA_PREFIX: &str = "DATA:";

// ============================================================================
// Timing
// ============================================================================

/// Default bound on a command round trip, in milliseconds.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 1000;

/// Default serial poll period, in milliseconds.
pub const DEFAULT_POLL_PERIOD_MS: u64 = 100;

/// Default timeout of a single poll-issued read, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

// ============================================================================
// Symbology Type Codes
// ============================================================================

/// Largest value representable by the 24-bit symbology type code.
pub const MAX_SYMBOLOGY_CODE: u32 = 0x00FF_FFFF;

/// EAN-13 / UPC-A type code (status bytes `00 0C 0B`).
pub const SYMBOLOGY_EAN13: u32 = 0x000B_0C00;

/// Code 128 type code (status bytes `00 18 0B`).
pub const SYMBOLOGY_CODE128: u32 = 0x000B_1800;

/// Code 39 type code (status bytes `00 01 0B`).
pub const SYMBOLOGY_CODE39: u32 = 0x000B_0100;

/// Generic / unknown type code (status bytes `00 33 0B`).
pub const SYMBOLOGY_GENERIC: u32 = 0x000B_3300;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_layout_adds_up() {
        assert_eq!(REPORT_HEADER_SIZE, 4);
        assert_eq!(REPORT_PAYLOAD_CAPACITY, 60);
    }

    #[test]
    fn test_report_enable_command_literal() {
        assert_eq!(REPORT_ENABLE_COMMAND, [17, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_report_commands_differ_only_in_opcode() {
        assert_eq!(REPORT_DISABLE_COMMAND[0], REPORT_DISABLE_OPCODE);
        assert_eq!(REPORT_STATUS_COMMAND[0], REPORT_STATUS_OPCODE);
        assert_eq!(REPORT_DISABLE_COMMAND[1..], REPORT_ENABLE_COMMAND[1..]);
    }

    #[test]
    fn test_serial_commands_are_crlf_terminated() {
        for command in [
            SERIAL_ENABLE_COMMAND,
            SERIAL_DISABLE_COMMAND,
            SERIAL_STATUS_COMMAND,
        ] {
            assert!(command.ends_with("\r\n"));
            assert!(command.len() < SERIAL_CAPTURE_CAPACITY);
        }
    }

    #[test]
    fn test_symbology_codes_fit_24_bits() {
        for code in [
            SYMBOLOGY_EAN13,
            SYMBOLOGY_CODE128,
            SYMBOLOGY_CODE39,
            SYMBOLOGY_GENERIC,
        ] {
            assert!(code <= MAX_SYMBOLOGY_CODE);
        }
    }
}
