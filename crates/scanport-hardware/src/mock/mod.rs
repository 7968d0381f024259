//! In-memory stand-ins for the platform.
//!
//! Each mock comes paired with a handle that scripts its behaviour and records
//! what the backend did with it, so tests and demos run without hardware.

pub mod provider;
pub mod report;
pub mod serial;

pub use provider::MockProvider;
pub use report::{MockReportPipe, MockReportPipeHandle};
pub use serial::{LinkOp, MockSerialLink, MockSerialLinkHandle, ReadOutcome};
