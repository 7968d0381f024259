//! Backend tuning, line settings and statistics snapshots.

use scanport_core::constants::{
    DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_POLL_PERIOD_MS, DEFAULT_READ_TIMEOUT_MS, SERIAL_BAUD_RATE,
    SERIAL_DATA_BITS, SERIAL_STOP_BITS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Parity setting of a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Serial line parameters passed to [`ConnectionProvider::open_serial`].
///
/// [`ConnectionProvider::open_serial`]: crate::traits::ConnectionProvider::open_serial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
}

impl LineSettings {
    /// 9600-8-N-1, the only setting the scanner speaks.
    pub const SCANNER: Self = Self {
        baud_rate: SERIAL_BAUD_RATE,
        data_bits: SERIAL_DATA_BITS,
        parity: Parity::None,
        stop_bits: SERIAL_STOP_BITS,
    };
}

impl fmt::Display for LineSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        write!(
            f,
            "{}-{}-{}-{}",
            self.baud_rate, self.data_bits, parity, self.stop_bits
        )
    }
}

/// How the serial backend turns poll reads into frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameAssembly {
    /// Each read is decoded on its own; an unterminated trailing run is lost.
    #[default]
    SingleShot,

    /// Partial runs are kept across reads and completed by later ones.
    Reassemble,
}

/// Serial timing parameters, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialTiming {
    /// Bound on one command write.
    pub command_timeout_ms: u64,

    /// Poll cycle period.
    pub poll_period_ms: u64,

    /// Timeout passed to each poll-issued read.
    pub read_timeout_ms: u64,
}

impl Default for SerialTiming {
    fn default() -> Self {
        Self {
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            poll_period_ms: DEFAULT_POLL_PERIOD_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl SerialTiming {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Poll period, never shorter than one millisecond.
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms.max(1))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Host-side backend options. Not part of [`ScannerConfiguration`] since the
/// scanner itself never sees them.
///
/// [`ScannerConfiguration`]: scanport_core::ScannerConfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerOptions {
    pub timing: SerialTiming,
    pub frame_assembly: FrameAssembly,
}

/// Snapshot of a backend's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScannerStats {
    /// Frames (or reports) accepted by the codec.
    pub frames_received: u64,

    /// Rejected data and failed reads.
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner_line_settings() {
        assert_eq!(LineSettings::SCANNER.to_string(), "9600-8-N-1");
    }

    #[test]
    fn test_default_timing() {
        let timing = SerialTiming::default();
        assert_eq!(timing.command_timeout(), Duration::from_millis(1000));
        assert_eq!(timing.poll_period(), Duration::from_millis(100));
        assert_eq!(timing.read_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_poll_period_is_clamped() {
        let timing = SerialTiming {
            poll_period_ms: 0,
            ..SerialTiming::default()
        };
        assert_eq!(timing.poll_period(), Duration::from_millis(1));
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: ScannerOptions =
            serde_json::from_str(r#"{"frame_assembly":"reassemble","timing":{"poll_period_ms":50}}"#)
                .unwrap();
        assert_eq!(options.frame_assembly, FrameAssembly::Reassemble);
        assert_eq!(options.timing.poll_period_ms, 50);
        assert_eq!(options.timing.command_timeout_ms, 1000);
    }
}
