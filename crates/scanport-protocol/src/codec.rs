//! Tokio codec for serial scanner streams.
//!
//! Hosts that own an async serial stream (for example a `tokio-serial` port or
//! a pseudo-terminal) can wrap it in `Framed` and exchange decoded
//! [`SerialFrame`]s and [`CommandName`]s directly:
//!
//! ```text
//! byte stream -> Decoder -> SerialFrame
//! CommandName -> Encoder -> "ENABLE\r\n"
//! ```
//!
//! # Usage
//!
//! ```
//! use futures::StreamExt;
//! use tokio_util::codec::FramedRead;
//! use scanport_protocol::{SerialFrameCodec, SerialReply};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let input: &[u8] = b"ACK\r\n4006381333931\r\n";
//! let mut frames = FramedRead::new(input, SerialFrameCodec::new());
//!
//! let ack = frames.next().await.unwrap().unwrap();
//! assert_eq!(SerialReply::classify(&ack), SerialReply::Ack);
//!
//! let barcode = frames.next().await.unwrap().unwrap();
//! assert_eq!(barcode.as_str(), Some("4006381333931"));
//! # }
//! ```
//!
//! Runs that outgrow the capture buffer are dropped without ending the stream.
//! Their count is available through [`SerialFrameCodec::take_overflows`].
//!
//! At end of stream, bytes after the last terminator never form a frame. The
//! codec discards that run and logs its length at debug level.

use bytes::BytesMut;
use scanport_core::CommandName;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::{
    FrameAccumulator, SerialFrame, command::serial_command, error::ProtocolError,
};

/// Codec pairing [`FrameAccumulator`] framing with serial command encoding.
#[derive(Debug, Default)]
pub struct SerialFrameCodec {
    accumulator: FrameAccumulator,
}

impl SerialFrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of oversized runs dropped since the last call.
    pub fn take_overflows(&mut self) -> usize {
        self.accumulator.take_overflows()
    }

    /// An unterminated run is waiting for its terminator.
    pub fn has_partial(&self) -> bool {
        self.accumulator.has_partial()
    }
}

impl Decoder for SerialFrameCodec {
    type Item = SerialFrame;
    type Error = ProtocolError;

    /// Decode the next frame from the byte stream.
    ///
    /// All of `src` is consumed on each call. Partial runs stay inside the
    /// accumulator until a later call completes them.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            self.accumulator.feed(src);
            src.clear();
        }
        Ok(self.accumulator.next_frame())
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if self.accumulator.has_partial() {
            debug!(
                "Discarding {} unterminated byte(s) at end of stream",
                self.accumulator.pending_len()
            );
            self.accumulator.clear();
        }
        Ok(None)
    }
}

impl Encoder<CommandName> for SerialFrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: CommandName, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(serial_command(item).as_bytes());
        Ok(())
    }
}
