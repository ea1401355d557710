//! Register and property metadata
//!
//! The declarative descriptor table plus the typed value model shared by
//! the property store and the command protocol.

pub mod table;
pub mod types;

pub use table::{PropertyDescriptor, PropertyId, TABLE};
pub use types::{AckPattern, DecodedValue, PropertyKind, WriteSpec, WriteValue};
