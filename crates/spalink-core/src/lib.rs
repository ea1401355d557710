//! # spalink-core
//!
//! Protocol engine for SpaNET-compatible spa and hot-tub controllers.
//!
//! Bridges the controller's half-duplex ASCII serial protocol to a typed,
//! observable property model:
//! - delimited frame reading with dynamic register-group offset discovery
//! - a declarative descriptor table decoding ~100 logical values with
//!   change detection
//! - a write path verified by echoed acknowledgments
//! - a tick-driven scheduler balancing read freshness, write latency, and
//!   burst debouncing
//!
//! Message-bus publication, UI description documents, provisioning, and
//! firmware delivery are external collaborators; they consume change
//! listeners and issue writes through [`engine::SpaLink`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::{Duration, Instant};
//! use spalink_core::engine::{EngineConfig, SpaLink};
//! use spalink_core::protocol::{open_port, SerialTransport};
//! use spalink_core::registers::PropertyId;
//!
//! # fn main() -> anyhow::Result<()> {
//! let port = open_port("/dev/ttyUSB0", None)?;
//! let mut engine = SpaLink::new(SerialTransport::new(port), EngineConfig::default());
//!
//! engine.subscribe(
//!     PropertyId::WaterTemperature,
//!     Box::new(|id, value| println!("{} -> {}", id.name(), value)),
//! );
//! engine.request_write(PropertyId::TargetTemperature, 215)?;
//!
//! loop {
//!     engine.tick(Instant::now());
//!     std::thread::sleep(Duration::from_millis(100));
//! }
//! # }
//! ```

#![warn(missing_docs)]

pub mod demo;
pub mod engine;
pub mod protocol;
pub mod registers;
pub mod scheduler;
pub mod store;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::demo::DemoController;
    pub use crate::engine::{EngineConfig, EngineCounters, SpaLink, TickOutcome};
    pub use crate::protocol::{
        Frame, FrameReader, LinkStats, ProtocolError, RegisterGroup, SerialTransport, Transport,
        Variant, WriteRequest,
    };
    pub use crate::registers::{DecodedValue, PropertyDescriptor, PropertyId, WriteValue};
    pub use crate::scheduler::{Action, UpdateScheduler};
    pub use crate::store::PropertyStore;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
