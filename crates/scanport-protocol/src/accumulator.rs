//! Persistent partial-frame buffer for the serial transport.
//!
//! [`decode_serial_frame`](crate::decode_serial_frame) looks at one read window
//! in isolation, so a barcode that straddles two poll reads is lost. The
//! [`FrameAccumulator`] keeps the unterminated printable run between feeds and
//! completes it when the terminator finally arrives.
//!
//! # Usage
//!
//! ```
//! use scanport_protocol::FrameAccumulator;
//!
//! let mut acc = FrameAccumulator::new();
//!
//! // First poll read ends mid-barcode
//! acc.feed(b"\x00400638");
//! assert!(acc.next_frame().is_none());
//!
//! // Second poll read carries the rest
//! acc.feed(b"1333931\r\n");
//! let frame = acc.next_frame().unwrap();
//! assert_eq!(frame.as_str(), Some("4006381333931"));
//! ```

use bytes::BytesMut;
use scanport_core::constants::{SERIAL_CAPTURE_CAPACITY, SERIAL_MAX_FRAME_LENGTH};
use std::collections::VecDeque;

use crate::serial::{SerialFrame, is_printable, is_terminator};

const INITIAL_FRAME_QUEUE_CAPACITY: usize = 4;

/// State machine states of the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    /// Skipping bytes until a printable one starts a frame.
    WaitingStart,

    /// Capturing a frame until CR, LF or NUL.
    ReadingFrame,

    /// The current run outgrew the capture buffer; skipping to its terminator.
    Discarding,
}

/// Stateful serial frame parser.
///
/// Frames are extracted with the same rules as the single-shot decoder: a run
/// starts at the first printable byte and ends before the first CR, LF or NUL.
/// Bytes inside the run are kept as-is.
///
/// ```text
/// ┌─────────────┐ printable  ┌──────────────┐ CR/LF/NUL ┌─────────────┐
/// │WaitingStart │───────────>│ ReadingFrame │──────────>│ Frame ready │
/// └─────────────┘            └──────────────┘           └─────────────┘
///        ^                          │ > 255 bytes
///        │     CR/LF/NUL     ┌──────v───────┐
///        └───────────────────│  Discarding  │
///                            └──────────────┘
/// ```
///
/// A run that outgrows [`SERIAL_MAX_FRAME_LENGTH`] is dropped as a whole and
/// counted; see [`take_overflows`](Self::take_overflows).
#[derive(Debug)]
pub struct FrameAccumulator {
    state: AccumulatorState,
    capture: BytesMut,
    frames: VecDeque<SerialFrame>,
    overflows: usize,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self {
            state: AccumulatorState::WaitingStart,
            capture: BytesMut::with_capacity(SERIAL_CAPTURE_CAPACITY),
            frames: VecDeque::with_capacity(INITIAL_FRAME_QUEUE_CAPACITY),
            overflows: 0,
        }
    }

    /// Feed one read's worth of bytes.
    ///
    /// Every frame completed by these bytes is queued for [`next_frame`](Self::next_frame).
    ///
    /// ```
    /// use scanport_protocol::FrameAccumulator;
    ///
    /// let mut acc = FrameAccumulator::new();
    /// acc.feed(b"ONE\rTWO\rTHR");
    /// assert_eq!(acc.frames_available(), 2);
    /// assert!(acc.has_partial());
    /// ```
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match self.state {
                AccumulatorState::WaitingStart => {
                    if is_printable(byte) {
                        self.capture.clear();
                        self.capture.extend_from_slice(&[byte]);
                        self.state = AccumulatorState::ReadingFrame;
                    }
                }
                AccumulatorState::ReadingFrame => {
                    if is_terminator(byte) {
                        self.complete_frame();
                    } else if self.capture.len() == SERIAL_MAX_FRAME_LENGTH {
                        self.capture.clear();
                        self.overflows += 1;
                        self.state = AccumulatorState::Discarding;
                    } else {
                        self.capture.extend_from_slice(&[byte]);
                    }
                }
                AccumulatorState::Discarding => {
                    if is_terminator(byte) {
                        self.state = AccumulatorState::WaitingStart;
                    }
                }
            }
        }
    }

    /// Take the oldest completed frame.
    pub fn next_frame(&mut self) -> Option<SerialFrame> {
        self.frames.pop_front()
    }

    /// Iterate over and remove all completed frames.
    pub fn drain_frames(&mut self) -> impl Iterator<Item = SerialFrame> + '_ {
        self.frames.drain(..)
    }

    pub fn frames_available(&self) -> usize {
        self.frames.len()
    }

    /// Number of runs dropped for exceeding the capture bound since the last call.
    pub fn take_overflows(&mut self) -> usize {
        std::mem::take(&mut self.overflows)
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    /// A started run is waiting for its terminator.
    pub fn has_partial(&self) -> bool {
        self.state == AccumulatorState::ReadingFrame
    }

    /// Bytes captured so far for the partial run.
    pub fn pending_len(&self) -> usize {
        if self.has_partial() {
            self.capture.len()
        } else {
            0
        }
    }

    /// Drop any partial run and queued frames.
    pub fn clear(&mut self) {
        self.capture.clear();
        self.frames.clear();
        self.overflows = 0;
        self.state = AccumulatorState::WaitingStart;
    }

    fn complete_frame(&mut self) {
        let frame = SerialFrame::from_capture(&self.capture);
        self.capture.clear();
        self.state = AccumulatorState::WaitingStart;
        self.frames.push_back(frame);
    }
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_serial_frame;

    #[test]
    fn test_new_accumulator() {
        let acc = FrameAccumulator::new();
        assert_eq!(acc.state(), AccumulatorState::WaitingStart);
        assert_eq!(acc.frames_available(), 0);
        assert!(!acc.has_partial());
    }

    #[test]
    fn test_single_window_matches_single_shot() {
        let raw = b"\x00\x00OK1234567890\r\n";
        let mut acc = FrameAccumulator::new();
        acc.feed(raw);
        assert_eq!(acc.next_frame(), decode_serial_frame(raw));
    }

    #[test]
    fn test_frame_split_across_three_feeds() {
        let mut acc = FrameAccumulator::new();
        acc.feed(b"AB");
        acc.feed(b"CD");
        assert!(acc.next_frame().is_none());
        assert_eq!(acc.state(), AccumulatorState::ReadingFrame);

        acc.feed(b"EF\n");
        assert_eq!(acc.next_frame().unwrap().as_bytes(), b"ABCDEF");
        assert_eq!(acc.state(), AccumulatorState::WaitingStart);
    }

    #[test]
    fn test_multiple_frames_in_one_feed() {
        let mut acc = FrameAccumulator::new();
        acc.feed(b"ACK\r\n12345678\r\nDATA:1\r\n");

        let frames: Vec<_> = acc.drain_frames().map(|f| f.to_string()).collect();
        assert_eq!(frames, vec!["ACK", "12345678", "DATA:1"]);
        assert_eq!(acc.frames_available(), 0);
    }

    #[test]
    fn test_noise_between_frames_is_skipped() {
        let mut acc = FrameAccumulator::new();
        acc.feed(b"\x01\x02\r\n\x00A\r\x7F\x7FB\n");
        let frames: Vec<_> = acc.drain_frames().map(|f| f.to_string()).collect();
        assert_eq!(frames, vec!["A", "B"]);
    }

    #[test]
    fn test_overflowing_run_is_dropped_whole() {
        let mut acc = FrameAccumulator::new();
        acc.feed(&[b'Z'; 200]);
        acc.feed(&[b'Z'; 200]);
        assert_eq!(acc.state(), AccumulatorState::Discarding);

        acc.feed(b"ZZZ\rOK\r");
        assert_eq!(acc.take_overflows(), 1);
        assert_eq!(acc.take_overflows(), 0);

        let frames: Vec<_> = acc.drain_frames().map(|f| f.to_string()).collect();
        assert_eq!(frames, vec!["OK"]);
    }

    #[test]
    fn test_run_at_capture_bound_is_kept() {
        let mut acc = FrameAccumulator::new();
        let mut raw = vec![b'Q'; SERIAL_MAX_FRAME_LENGTH];
        raw.push(b'\n');
        acc.feed(&raw);

        assert_eq!(acc.take_overflows(), 0);
        assert_eq!(acc.next_frame().unwrap().len(), SERIAL_MAX_FRAME_LENGTH);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut acc = FrameAccumulator::new();
        acc.feed(b"DONE\rPART");
        assert_eq!(acc.pending_len(), 4);
        acc.clear();
        assert_eq!(acc.pending_len(), 0);
        assert_eq!(acc.state(), AccumulatorState::WaitingStart);
        assert_eq!(acc.frames_available(), 0);

        acc.feed(b"\n");
        assert!(acc.next_frame().is_none());
    }
}
