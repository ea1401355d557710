//! Status frame reading
//!
//! A poll returns one long comma-separated field sequence with no length
//! field. Section tags (`R2`, `R3`, ...) embedded in the stream mark where
//! each register group starts; the reader discovers those offsets on the
//! first successful poll and trusts them for the rest of the connection.

use serde::{Deserialize, Serialize};

use super::transport::Transport;
use super::{
    ProtocolError, FIELD_DELIMITER, FRAME_MARKER, MAX_FRAME_FIELDS, POLL_COMMAND, READ_TIMEOUT,
};

/// The closed set of register groups, in the order they appear in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegisterGroup {
    /// Power and environment (mains current/voltage, case temperature, clock)
    R2,
    /// Controller identity (model, serial, software version)
    R3,
    /// Operating and lock mode
    R4,
    /// Live status (temperatures, heater, pump and blower states)
    R5,
    /// User settings (set temperature, lights, filtration, power save)
    R6,
    /// Installed hardware configuration
    R7,
    /// Fault log, newest entry
    R9,
    /// Fault log, previous entry
    RA,
    /// Accumulated runtime counters
    RB,
    /// Power statistics
    RC,
    /// Heat pump detail
    RE,
    /// Pump install states and lock configuration
    RG,
}

impl RegisterGroup {
    /// All groups in frame order
    pub const ALL: [RegisterGroup; 12] = [
        RegisterGroup::R2,
        RegisterGroup::R3,
        RegisterGroup::R4,
        RegisterGroup::R5,
        RegisterGroup::R6,
        RegisterGroup::R7,
        RegisterGroup::R9,
        RegisterGroup::RA,
        RegisterGroup::RB,
        RegisterGroup::RC,
        RegisterGroup::RE,
        RegisterGroup::RG,
    ];

    /// The tag string as it appears on the wire
    pub fn tag(&self) -> &'static str {
        match self {
            RegisterGroup::R2 => "R2",
            RegisterGroup::R3 => "R3",
            RegisterGroup::R4 => "R4",
            RegisterGroup::R5 => "R5",
            RegisterGroup::R6 => "R6",
            RegisterGroup::R7 => "R7",
            RegisterGroup::R9 => "R9",
            RegisterGroup::RA => "RA",
            RegisterGroup::RB => "RB",
            RegisterGroup::RC => "RC",
            RegisterGroup::RE => "RE",
            RegisterGroup::RG => "RG",
        }
    }

    /// Minimum number of data fields this group must carry for a frame to
    /// be valid. These are the smaller (SV2) expectations; SV3 firmware
    /// pads some groups with extra fields beyond the minimum.
    pub fn min_fields(&self) -> usize {
        match self {
            RegisterGroup::R2 => 9,
            RegisterGroup::R3 => 8,
            RegisterGroup::R4 => 2,
            RegisterGroup::R5 => 26,
            RegisterGroup::R6 => 25,
            RegisterGroup::R7 => 24,
            RegisterGroup::R9 => 11,
            RegisterGroup::RA => 11,
            RegisterGroup::RB => 12,
            RegisterGroup::RC => 30,
            RegisterGroup::RE => 22,
            RegisterGroup::RG => 12,
        }
    }

    /// Dense index for table storage
    pub fn index(&self) -> usize {
        RegisterGroup::ALL
            .iter()
            .position(|g| g == self)
            .unwrap_or(0)
    }

    fn from_tag(tag: &str) -> Option<RegisterGroup> {
        RegisterGroup::ALL.iter().copied().find(|g| g.tag() == tag)
    }
}

/// Firmware variant, detected from the model-name field at `R3 + 0`.
///
/// The two variants lay out the same groups but with different total field
/// counts; the variant fixes which minimum the whole frame is validated
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// SV2-series firmware
    Sv2,
    /// SV3-series firmware (extra fields in R5/R6)
    Sv3,
}

impl Variant {
    /// The minimum total field count (marker and tags included) a valid
    /// frame must reach for this variant.
    pub fn min_total_fields(&self) -> usize {
        match self {
            Variant::Sv2 => 205,
            Variant::Sv3 => 219,
        }
    }

    fn from_marker(marker: &str) -> Option<Variant> {
        match marker {
            "SV2" => Some(Variant::Sv2),
            "SV3" => Some(Variant::Sv3),
            _ => None,
        }
    }
}

/// Relative offset within R3 of the firmware-variant marker (model name)
pub const VARIANT_MARKER_OFFSET: usize = 0;

type OffsetMap = [Option<usize>; RegisterGroup::ALL.len()];

/// One complete, validated response to a status poll.
///
/// Frames are transient: built by the reader, decoded by the property
/// store, then discarded.
#[derive(Debug, Clone)]
pub struct Frame {
    fields: Vec<String>,
    offsets: OffsetMap,
    variant: Variant,
}

impl Frame {
    /// Raw field at `group_offset + 1 + rel` (the tag itself is not a data
    /// field). Returns `None` when the frame is too short for the offset.
    pub fn field(&self, group: RegisterGroup, rel: usize) -> Option<&str> {
        let base = self.offsets[group.index()]?;
        self.fields.get(base + 1 + rel).map(|s| s.as_str())
    }

    /// Field index where a group's tag sits
    pub fn group_offset(&self, group: RegisterGroup) -> Option<usize> {
        self.offsets[group.index()]
    }

    /// Detected firmware variant
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Total number of fields, marker and tags included
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Issues status polls and turns the delimited byte stream into validated
/// [`Frame`]s. Owns the discovered group offsets and the detected firmware
/// variant for the life of the connection.
pub struct FrameReader {
    /// Offsets committed from the first successful frame
    offsets: Option<OffsetMap>,
    variant: Option<Variant>,
}

impl FrameReader {
    /// Create a reader with no discovered layout yet
    pub fn new() -> Self {
        Self {
            offsets: None,
            variant: None,
        }
    }

    /// Discovered firmware variant, if any poll has succeeded far enough
    pub fn variant(&self) -> Option<Variant> {
        self.variant
    }

    /// Whether group offsets have been discovered
    pub fn has_offsets(&self) -> bool {
        self.offsets.is_some()
    }

    /// Send one status poll and read back a validated frame.
    ///
    /// Any gap, marker mismatch, shifted tag, or under-count group rejects
    /// the whole frame: a bad read is assumed corrupted, not partial.
    /// Offsets and variant survive a rejected poll.
    pub fn poll<T: Transport>(&mut self, transport: &mut T) -> Result<Frame, ProtocolError> {
        transport.flush_input()?;
        transport.write(POLL_COMMAND.as_bytes())?;

        let mut fields: Vec<String> = Vec::with_capacity(MAX_FRAME_FIELDS);
        let mut discovered: OffsetMap = [None; RegisterGroup::ALL.len()];
        // Next group we expect a tag for, and the group currently
        // accumulating data fields
        let mut next_group = 0usize;
        let mut current: Option<RegisterGroup> = None;
        let mut counts = [0usize; RegisterGroup::ALL.len()];
        let mut variant = self.variant;

        loop {
            if fields.len() >= MAX_FRAME_FIELDS {
                return Err(ProtocolError::MalformedFrame(format!(
                    "field cap {} exceeded without completing frame",
                    MAX_FRAME_FIELDS
                )));
            }

            let raw = self.read_field(transport)?;
            let index = fields.len();

            if index == 0 {
                if raw != FRAME_MARKER {
                    return Err(ProtocolError::MalformedFrame(format!(
                        "bad poll-response marker: '{}'",
                        raw
                    )));
                }
                fields.push(raw);
                continue;
            }

            if raw.is_empty() {
                // One unannounced gap invalidates the whole poll
                return Err(ProtocolError::MalformedFrame(format!(
                    "empty field at index {}",
                    index
                )));
            }

            if let Some(group) = RegisterGroup::from_tag(&raw) {
                if discovered[group.index()].is_none() {
                    // A tag we have not seen in this frame: must be the
                    // next group in sequence
                    if next_group >= RegisterGroup::ALL.len()
                        || RegisterGroup::ALL[next_group] != group
                    {
                        return Err(ProtocolError::MalformedFrame(format!(
                            "group tag {} out of sequence at index {}",
                            group.tag(),
                            index
                        )));
                    }
                    // Discovered offsets are immutable for the connection:
                    // a moved tag means the stream is corrupt
                    if let Some(known) = self.offsets {
                        if known[group.index()] != Some(index) {
                            return Err(ProtocolError::MalformedFrame(format!(
                                "group {} moved from {:?} to {}",
                                group.tag(),
                                known[group.index()],
                                index
                            )));
                        }
                    }
                    discovered[group.index()] = Some(index);
                    next_group += 1;
                    current = Some(group);
                    fields.push(raw);
                    continue;
                }
                // Tag text reappearing inside a group is treated as data
            }

            let Some(group) = current else {
                return Err(ProtocolError::MalformedFrame(format!(
                    "data field '{}' before first group tag",
                    raw
                )));
            };
            counts[group.index()] += 1;

            // Variant marker sits at a fixed offset in R3; the first
            // observation fixes the total-field expectation
            if group == RegisterGroup::R3 && counts[group.index()] == VARIANT_MARKER_OFFSET + 1 {
                match Variant::from_marker(&raw) {
                    Some(v) => {
                        if variant.is_none() {
                            tracing::info!(marker = %raw, "firmware variant detected");
                            variant = Some(v);
                        } else if variant != Some(v) {
                            tracing::warn!(
                                marker = %raw,
                                "variant marker changed mid-connection, keeping original"
                            );
                        }
                    }
                    None => return Err(ProtocolError::UnknownVariant(raw)),
                }
            }

            fields.push(raw);

            // Done once the last group has its minimum field count
            let last = RegisterGroup::ALL[RegisterGroup::ALL.len() - 1];
            if group == last && counts[last.index()] >= last.min_fields() {
                break;
            }
        }

        // The tail after the last group carries nothing meaningful
        transport.flush_input()?;

        for group in RegisterGroup::ALL {
            if discovered[group.index()].is_none() {
                return Err(ProtocolError::MalformedFrame(format!(
                    "group {} missing",
                    group.tag()
                )));
            }
            if counts[group.index()] < group.min_fields() {
                return Err(ProtocolError::MalformedFrame(format!(
                    "group {} has {} fields, expected at least {}",
                    group.tag(),
                    counts[group.index()],
                    group.min_fields()
                )));
            }
        }

        let Some(variant) = variant else {
            return Err(ProtocolError::MalformedFrame(
                "variant marker never observed".to_string(),
            ));
        };
        if fields.len() < variant.min_total_fields() {
            return Err(ProtocolError::MalformedFrame(format!(
                "{} fields, {:?} requires at least {}",
                fields.len(),
                variant,
                variant.min_total_fields()
            )));
        }

        // First fully valid frame: commit layout for the connection
        if self.offsets.is_none() {
            tracing::debug!(fields = fields.len(), ?variant, "frame layout discovered");
            self.offsets = Some(discovered);
        }
        self.variant = Some(variant);

        Ok(Frame {
            fields,
            offsets: self.offsets.unwrap_or(discovered),
            variant,
        })
    }

    fn read_field<T: Transport>(&self, transport: &mut T) -> Result<String, ProtocolError> {
        let bytes = transport.read_until(FIELD_DELIMITER, READ_TIMEOUT)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_matches(['\r', '\n']).to_string())
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}
