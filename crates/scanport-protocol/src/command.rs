//! Outbound command encoding for both transports.

use bytes::Bytes;
use scanport_core::{
    CommandName, Transport,
    constants::{
        REPORT_COMMAND_SIZE, REPORT_DISABLE_COMMAND, REPORT_ENABLE_COMMAND, REPORT_STATUS_COMMAND,
        SERIAL_DISABLE_COMMAND, SERIAL_ENABLE_COMMAND, SERIAL_STATUS_COMMAND,
    },
};

/// Output report for a command on the report transport.
pub fn report_command(name: CommandName) -> [u8; REPORT_COMMAND_SIZE] {
    match name {
        CommandName::Enable => REPORT_ENABLE_COMMAND,
        CommandName::Disable => REPORT_DISABLE_COMMAND,
        CommandName::Status => REPORT_STATUS_COMMAND,
    }
}

/// CR/LF-terminated request for a command on the serial transport.
pub fn serial_command(name: CommandName) -> &'static str {
    match name {
        CommandName::Enable => SERIAL_ENABLE_COMMAND,
        CommandName::Disable => SERIAL_DISABLE_COMMAND,
        CommandName::Status => SERIAL_STATUS_COMMAND,
    }
}

/// Encode a command for the given transport.
///
/// ```
/// use scanport_core::{CommandName, Transport};
/// use scanport_protocol::encode_command;
///
/// let report = encode_command(CommandName::Enable, Transport::Report);
/// assert_eq!(&report[..], &[17, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
///
/// let serial = encode_command(CommandName::Disable, Transport::Serial);
/// assert_eq!(&serial[..], b"DISABLE\r\n");
/// ```
pub fn encode_command(name: CommandName, transport: Transport) -> Bytes {
    match transport {
        Transport::Report => Bytes::copy_from_slice(&report_command(name)),
        Transport::Serial => Bytes::from_static(serial_command(name).as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_report_enable_literal() {
        let encoded = encode_command(CommandName::Enable, Transport::Report);
        assert_eq!(encoded.as_ref(), [17u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[rstest]
    #[case(CommandName::Enable, 17)]
    #[case(CommandName::Disable, 18)]
    #[case(CommandName::Status, 19)]
    fn test_report_commands_fill_command_report(#[case] name: CommandName, #[case] opcode: u8) {
        let encoded = encode_command(name, Transport::Report);
        assert_eq!(encoded.len(), REPORT_COMMAND_SIZE);
        assert_eq!(encoded[0], opcode);
        assert!(encoded[1..].iter().all(|&b| b == 0));
    }

    #[rstest]
    #[case(CommandName::Enable, "ENABLE\r\n")]
    #[case(CommandName::Disable, "DISABLE\r\n")]
    #[case(CommandName::Status, "STATUS\r\n")]
    fn test_serial_commands(#[case] name: CommandName, #[case] expected: &str) {
        assert_eq!(
            encode_command(name, Transport::Serial).as_ref(),
            expected.as_bytes()
        );
    }
}
