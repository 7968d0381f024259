//! Frame and packet codec for barcode scanner transports.
//!
//! Pure functions over byte slices; no I/O happens here. The hardware crate
//! feeds these with whatever the report pipe or serial link produced.

pub mod accumulator;
pub mod codec;
pub mod command;
pub mod error;
pub mod reply;
pub mod report;
pub mod serial;
pub mod symbology;

pub use accumulator::{AccumulatorState, FrameAccumulator};
pub use codec::SerialFrameCodec;
pub use command::{encode_command, report_command, serial_command};
pub use error::{ProtocolError, RejectReason};
pub use reply::SerialReply;
pub use report::{ReportPacket, decode_report_packet, encode_report_packet};
pub use serial::{SerialFrame, decode_serial_frame};
pub use symbology::classify_symbology;
