//! Write command protocol
//!
//! Sends a single write command and validates the controller's echoed
//! acknowledgment within a fixed deadline. Never retries; retry policy
//! belongs to the caller.

use std::time::Duration;

use super::transport::Transport;
use super::{ProtocolError, ACK_TIMEOUT, REPLY_TERMINATOR};
use crate::registers::{AckPattern, DecodedValue, PropertyId, WriteValue};
use crate::store::PropertyStore;

/// Opcode prefixed to every write command
pub const WRITE_OPCODE: char = 'W';

/// One queued write, consumed by a single send attempt
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// Property updated optimistically on ack; `None` for raw commands
    pub target: Option<PropertyId>,
    /// Full command text, without the trailing newline
    pub command: String,
    /// Reply expected back from the controller, compared verbatim
    pub expected_ack: String,
    /// Value applied to the store on ack
    pub value: Option<DecodedValue>,
    /// Send attempts made so far
    pub attempts: u32,
    /// Ack deadline for this request
    pub deadline: Duration,
}

impl WriteRequest {
    /// Build a request for a writable property.
    ///
    /// Encodes the value, checks the descriptor's raw range, and derives
    /// the expected acknowledgment from the descriptor's ack pattern.
    pub fn for_property(id: PropertyId, value: &WriteValue) -> Result<Self, ProtocolError> {
        let desc = id.descriptor();
        let Some(write) = &desc.write else {
            return Err(ProtocolError::InvalidWrite(format!(
                "{} is read-only",
                desc.name
            )));
        };

        let raw = desc.kind.encode(value).ok_or_else(|| {
            ProtocolError::InvalidWrite(format!("{:?} not encodable for {}", value, desc.name))
        })?;

        if let Some(range) = &write.range {
            let numeric: i64 = raw.parse().map_err(|_| {
                ProtocolError::InvalidWrite(format!("'{}' is not numeric for {}", raw, desc.name))
            })?;
            if !range.contains(&numeric) {
                return Err(ProtocolError::InvalidWrite(format!(
                    "{} out of range {:?} for {}",
                    numeric, range, desc.name
                )));
            }
        }

        let expected_ack = match write.ack {
            AckPattern::Echo => raw.clone(),
            AckPattern::Fixed(token) => token.to_string(),
        };

        Ok(Self {
            target: Some(id),
            command: format!("{}{}:{}", WRITE_OPCODE, write.register, raw),
            expected_ack,
            value: desc.kind.decoded_from_raw(&raw),
            attempts: 0,
            deadline: ACK_TIMEOUT,
        })
    }

    /// Build a raw command request with an explicit expected reply
    pub fn raw(command: impl Into<String>, expected_ack: impl Into<String>) -> Self {
        Self {
            target: None,
            command: command.into(),
            expected_ack: expected_ack.into(),
            value: None,
            attempts: 0,
            deadline: ACK_TIMEOUT,
        }
    }
}

/// Send one write command and verify its echo.
///
/// On an exact match the target property is optimistically updated in the
/// store and marked dirty. On mismatch the store is untouched and
/// `WriteNotAcknowledged` is returned; on silence, `Timeout`.
pub fn send<T: Transport>(
    transport: &mut T,
    store: &mut PropertyStore,
    request: &mut WriteRequest,
) -> Result<(), ProtocolError> {
    request.attempts += 1;

    transport.flush_input()?;
    let mut line = request.command.clone().into_bytes();
    line.push(b'\n');
    transport.write(&line)?;

    let reply_bytes = transport.read_until(REPLY_TERMINATOR, request.deadline)?;
    let reply = String::from_utf8_lossy(&reply_bytes);
    let reply = reply.trim_matches(['\r', '\n']);

    if reply != request.expected_ack {
        tracing::warn!(
            command = %request.command,
            expected = %request.expected_ack,
            actual = %reply,
            "write echo mismatch"
        );
        return Err(ProtocolError::WriteNotAcknowledged {
            expected: request.expected_ack.clone(),
            actual: reply.to_string(),
        });
    }

    if let (Some(id), Some(value)) = (request.target, request.value.clone()) {
        store.apply_write(id, value);
    }
    tracing::debug!(command = %request.command, "write acknowledged");
    Ok(())
}
