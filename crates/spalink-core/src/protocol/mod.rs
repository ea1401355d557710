//! Serial protocol communication
//!
//! Implements the half-duplex ASCII protocol spoken by SpaNET-compatible
//! spa control boards: comma-delimited status polls with self-describing
//! section tags, and write commands verified by echoed acknowledgments.

pub mod command;
mod error;
pub mod frame;
pub mod serial;
pub mod transport;

pub use command::{WriteRequest, WRITE_OPCODE};
pub use error::ProtocolError;
pub use frame::{Frame, FrameReader, RegisterGroup, Variant, VARIANT_MARKER_OFFSET};
pub use serial::{clear_buffers, configure_port, list_ports, open_port, PortInfo};
pub use transport::{LinkStats, SerialTransport, Transport};

use std::time::Duration;

/// Default baud rate for the controller link
pub const DEFAULT_BAUD_RATE: u32 = 38400;

/// Status poll command, sent verbatim
pub const POLL_COMMAND: &str = "RF:\n";

/// Expected value of field 0 in a poll response
pub const FRAME_MARKER: &str = "RF:";

/// Field delimiter within a poll response
pub const FIELD_DELIMITER: u8 = b',';

/// Terminator of a write-command reply line
pub const REPLY_TERMINATOR: u8 = b'\r';

/// Hard cap on fields read per poll before the frame is declared bad
pub const MAX_FRAME_FIELDS: usize = 330;

/// Deadline for each delimited field read during a poll
pub const READ_TIMEOUT: Duration = Duration::from_millis(1500);

/// Deadline for a write acknowledgment
pub const ACK_TIMEOUT: Duration = Duration::from_millis(800);
