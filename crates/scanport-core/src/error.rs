use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid serial port number: {0} (expected 1-255)")]
    InvalidPortNumber(u8),

    // Protocol value errors
    #[error("Symbology code {0:#X} does not fit in 24 bits")]
    InvalidSymbologyCode(u32),

    #[error("Unknown transport: {0}")]
    UnknownTransport(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    // State errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, Error>;
