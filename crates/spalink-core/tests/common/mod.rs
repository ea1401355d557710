//! Shared test fixtures: a scripted transport and synthetic frame builders.

// Not every test binary uses every fixture
#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use spalink_core::protocol::{LinkStats, ProtocolError, RegisterGroup, Transport, FRAME_MARKER};
use spalink_core::registers::PropertyId;

/// Transport that serves one pre-scripted response per command line written.
pub struct ScriptedTransport {
    responses: VecDeque<Vec<u8>>,
    buffer: VecDeque<u8>,
    partial: Vec<u8>,
    /// Every complete command line the engine wrote
    pub writes: Vec<String>,
    /// Total bytes discarded by flush_input
    pub flushed: usize,
    stats: LinkStats,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            responses: VecDeque::new(),
            buffer: VecDeque::new(),
            partial: Vec::new(),
            writes: Vec::new(),
            flushed: 0,
            stats: LinkStats::default(),
        }
    }

    /// Queue the response served for the next command line
    pub fn push_response(&mut self, bytes: impl Into<Vec<u8>>) {
        self.responses.push_back(bytes.into());
    }
}

impl Transport for ScriptedTransport {
    fn read_until(&mut self, delimiter: u8, _timeout: Duration) -> Result<Vec<u8>, ProtocolError> {
        let Some(pos) = self.buffer.iter().position(|b| *b == delimiter) else {
            return Err(ProtocolError::Timeout);
        };
        let mut field = Vec::with_capacity(pos);
        for _ in 0..pos {
            field.push(self.buffer.pop_front().unwrap_or_default());
        }
        self.buffer.pop_front();
        self.stats.rx_bytes += pos as u64 + 1;
        Ok(field)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.stats.tx_bytes += bytes.len() as u64;
        for &b in bytes {
            if b == b'\n' {
                let line = String::from_utf8_lossy(&self.partial).to_string();
                self.partial.clear();
                self.writes.push(line);
                if let Some(response) = self.responses.pop_front() {
                    self.buffer.extend(response);
                }
            } else {
                self.partial.push(b);
            }
        }
        Ok(())
    }

    fn flush_input(&mut self) -> Result<usize, ProtocolError> {
        let discarded = self.buffer.len();
        self.flushed += discarded;
        self.buffer.clear();
        self.stats.rx_bytes += discarded as u64;
        Ok(discarded)
    }

    fn stats(&self) -> LinkStats {
        self.stats
    }
}

/// Extra fields SV3 firmware pads into some groups
fn sv3_extra(group: RegisterGroup) -> usize {
    match group {
        RegisterGroup::R5 => 8,
        RegisterGroup::R6 => 6,
        _ => 0,
    }
}

fn data_count(group: RegisterGroup, marker: &str) -> usize {
    group.min_fields() + if marker == "SV3" { sv3_extra(group) } else { 0 }
}

/// Build a minimal well-formed frame as a field vector: marker, then each
/// group's tag followed by `min_fields` (plus SV3 padding) zero fields,
/// with the variant marker set.
pub fn frame_fields(marker: &str) -> Vec<String> {
    let mut fields = vec![FRAME_MARKER.to_string()];
    for group in RegisterGroup::ALL {
        fields.push(group.tag().to_string());
        fields.extend(std::iter::repeat("0".to_string()).take(data_count(group, marker)));
    }
    set(&mut fields, marker, PropertyId::ModelName, marker);
    fields
}

/// Absolute index of a property's field within a synthetic frame
pub fn field_index(marker: &str, id: PropertyId) -> usize {
    let desc = id.descriptor();
    let mut index = 1; // marker
    for group in RegisterGroup::ALL {
        if group == desc.group {
            return index + 1 + desc.offset;
        }
        index += 1 + data_count(group, marker);
    }
    unreachable!("group not in frame order");
}

/// Overwrite one property's raw field in a synthetic frame
pub fn set(fields: &mut [String], marker: &str, id: PropertyId, raw: &str) {
    fields[field_index(marker, id)] = raw.to_string();
}

/// Render fields to wire bytes, with a meaningless tail after the last group
pub fn render(fields: &[String]) -> Vec<u8> {
    let mut bytes = fields.join(",").into_bytes();
    bytes.extend_from_slice(b",*\n");
    bytes
}

/// A complete, valid response for the given variant marker
pub fn valid_response(marker: &str) -> Vec<u8> {
    render(&frame_fields(marker))
}
