use crate::{
    Result,
    constants::{
        MAX_SERIAL_PORT, MAX_SYMBOLOGY_CODE, MIN_SERIAL_PORT, SYMBOLOGY_CODE39, SYMBOLOGY_CODE128,
        SYMBOLOGY_EAN13, SYMBOLOGY_GENERIC,
    },
    error::Error,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical transport the scanner is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// USB interrupt pipe carrying fixed-size reports.
    #[default]
    Report,

    /// Legacy serial byte stream.
    Serial,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Report => write!(f, "report"),
            Transport::Serial => write!(f, "serial"),
        }
    }
}

impl std::str::FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" | "hid" | "usb" => Ok(Transport::Report),
            "serial" | "com" => Ok(Transport::Serial),
            other => Err(Error::UnknownTransport(other.to_string())),
        }
    }
}

/// Scanner family. Carried through for the host; the engine does not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerKind {
    #[default]
    Datalogic,
    Generic,
}

/// Report mode requested from the scanner firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    #[default]
    Standard,
    Extended,
}

/// Scanner configuration, immutable once applied to the engine.
///
/// # Examples
///
/// ```
/// use scanport_core::{ScannerConfiguration, Transport};
///
/// let config = ScannerConfiguration::serial(3);
/// assert_eq!(config.transport, Transport::Serial);
/// assert!(config.validate().is_ok());
///
/// let broken = ScannerConfiguration::serial(0);
/// assert!(broken.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfiguration {
    /// Whether the scanner should be bound at all.
    pub enabled: bool,

    /// Scanner family.
    pub scanner_kind: ScannerKind,

    /// Firmware report mode.
    pub report_mode: ReportMode,

    /// Transport selected at initialization.
    pub transport: Transport,

    /// Serial port number (1-255). Only meaningful for [`Transport::Serial`].
    pub serial_port_number: u8,
}

impl Default for ScannerConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            scanner_kind: ScannerKind::Datalogic,
            report_mode: ReportMode::Standard,
            transport: Transport::Report,
            serial_port_number: 1,
        }
    }
}

impl ScannerConfiguration {
    /// Configuration for a scanner on the report transport.
    pub fn report() -> Self {
        Self::default()
    }

    /// Configuration for a scanner on the given serial port.
    pub fn serial(port_number: u8) -> Self {
        Self {
            transport: Transport::Serial,
            serial_port_number: port_number,
            ..Self::default()
        }
    }

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPortNumber`] if the serial transport is selected
    /// with a port number outside 1-255. The configuration is never corrected.
    pub fn validate(&self) -> Result<()> {
        if self.transport == Transport::Serial
            && !(MIN_SERIAL_PORT..=MAX_SERIAL_PORT).contains(&self.serial_port_number)
        {
            return Err(Error::InvalidPortNumber(self.serial_port_number));
        }
        Ok(())
    }
}

/// 24-bit symbology type code.
///
/// On the wire the code is carried in three status bytes, least significant
/// byte first.
///
/// ```
/// use scanport_core::SymbologyCode;
///
/// let code = SymbologyCode::from_le_bytes([0x00, 0x18, 0x0B]);
/// assert_eq!(code, SymbologyCode::CODE128);
/// assert_eq!(code.to_le_bytes(), [0x00, 0x18, 0x0B]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbologyCode(u32);

impl SymbologyCode {
    pub const EAN13: Self = Self(SYMBOLOGY_EAN13);
    pub const CODE128: Self = Self(SYMBOLOGY_CODE128);
    pub const CODE39: Self = Self(SYMBOLOGY_CODE39);
    pub const GENERIC: Self = Self(SYMBOLOGY_GENERIC);

    /// Create a type code, rejecting values wider than 24 bits.
    pub fn new(code: u32) -> Result<Self> {
        if code > MAX_SYMBOLOGY_CODE {
            return Err(Error::InvalidSymbologyCode(code));
        }
        Ok(Self(code))
    }

    /// Assemble a type code from status bytes, least significant first.
    pub fn from_le_bytes(bytes: [u8; 3]) -> Self {
        Self(u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16)
    }

    /// Split the type code into status bytes, least significant first.
    pub fn to_le_bytes(self) -> [u8; 3] {
        let [lo, mid, hi, _] = self.0.to_le_bytes();
        [lo, mid, hi]
    }

    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Human-readable name for known codes.
    pub fn name(self) -> &'static str {
        match self.0 {
            SYMBOLOGY_EAN13 => "EAN-13/UPC-A",
            SYMBOLOGY_CODE128 => "Code 128",
            SYMBOLOGY_CODE39 => "Code 39",
            SYMBOLOGY_GENERIC => "Generic",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for SymbologyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#08X})", self.name(), self.0)
    }
}

/// A barcode read, normalized across transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeEvent {
    /// Raw barcode bytes as reported by the scanner.
    pub payload: Bytes,

    /// Symbology type code, from the report status bytes or the length heuristic.
    pub symbology: SymbologyCode,

    /// Transport the read arrived over.
    pub transport: Transport,

    /// Time the engine accepted the read.
    pub received_at: DateTime<Utc>,
}

impl BarcodeEvent {
    /// Create an event stamped with the current time.
    pub fn new(payload: impl Into<Bytes>, symbology: SymbologyCode, transport: Transport) -> Self {
        Self {
            payload: payload.into(),
            symbology,
            transport,
            received_at: Utc::now(),
        }
    }

    /// Payload as text, if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Lifecycle state of a transport backend.
///
/// # Valid Transitions
///
/// - Any state → `Configured` / `Faulted` (initialize)
/// - `Configured` / `Disabled` → `Enabled` (start)
/// - `Configured` / `Enabled` → `Disabled` (stop)
/// - Any state → `Uninitialized` (teardown)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Uninitialized,
    Configured,
    Enabled,
    Disabled,
    Faulted,
}

impl ConnectionState {
    /// Check whether `next` is reachable from this state.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        match (self, next) {
            (_, Uninitialized) => true,
            (_, Configured) | (_, Faulted) => true,
            (Configured, Enabled) | (Disabled, Enabled) => true,
            (Configured, Disabled) | (Enabled, Disabled) => true,
            _ => false,
        }
    }

    /// Validate and perform a transition.
    pub fn transition_to(&mut self, next: ConnectionState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(Error::InvalidStateTransition {
                from: self.to_string(),
                to: next.to_string(),
            });
        }
        *self = next;
        Ok(())
    }

    /// A connection handle is bound and usable for commands.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::Configured | ConnectionState::Enabled | ConnectionState::Disabled
        )
    }

    /// `start` may be attempted from this state.
    pub fn can_start(self) -> bool {
        matches!(self, ConnectionState::Configured | ConnectionState::Disabled)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Uninitialized => "Uninitialized",
            ConnectionState::Configured => "Configured",
            ConnectionState::Enabled => "Enabled",
            ConnectionState::Disabled => "Disabled",
            ConnectionState::Faulted => "Faulted",
        };
        write!(f, "{name}")
    }
}

/// Commands understood by both transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandName {
    Enable,
    Disable,
    Status,
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandName::Enable => write!(f, "ENABLE"),
            CommandName::Disable => write!(f, "DISABLE"),
            CommandName::Status => write!(f, "STATUS"),
        }
    }
}

impl std::str::FromStr for CommandName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ENABLE" => Ok(CommandName::Enable),
            "DISABLE" => Ok(CommandName::Disable),
            "STATUS" => Ok(CommandName::Status),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }
}
