//! Typed property values
//!
//! Provides the small closed set of value variants shared by every
//! property, plus the per-type decode/encode rules. Decoding is strict:
//! a field that fails its type's validity check is rejected and the old
//! value kept, so one corrupted field cannot poison the rest of a frame.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// How a raw field decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Plain integer
    Integer,
    /// Strict `{"0","1"}` boolean
    Boolean,
    /// Free text
    Text,
    /// Wall-clock time, `HH:MM`
    Time,
    /// Integer raw value displayed divided by `divisor`
    Scaled {
        /// Fixed-point divisor (e.g. 10 for tenths)
        divisor: i64,
    },
    /// Integer code with a value-to-label table
    Coded {
        /// Labels indexed by code
        labels: &'static [&'static str],
    },
    /// Unresolved encoding, passed through untouched
    Opaque,
}

/// A decoded property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecodedValue {
    /// Plain integer
    Integer(i64),
    /// Boolean flag
    Boolean(bool),
    /// Text (including opaque pass-through fields)
    Text(String),
    /// Wall-clock time
    Time(chrono::NaiveTime),
    /// Fixed-point value; `raw / divisor` is the display value
    Scaled {
        /// Raw wire integer
        raw: i64,
        /// Fixed-point divisor
        divisor: i64,
    },
    /// Enumerated code with its label
    Coded {
        /// Raw wire code
        code: i64,
        /// Label from the descriptor's table
        label: String,
    },
}

impl DecodedValue {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Integer(v) => Some(*v as f64),
            DecodedValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            DecodedValue::Scaled { raw, divisor } => Some(*raw as f64 / *divisor as f64),
            DecodedValue::Coded { code, .. } => Some(*code as f64),
            _ => None,
        }
    }

    /// Boolean view, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Raw wire integer behind the value, if any
    pub fn raw(&self) -> Option<i64> {
        match self {
            DecodedValue::Integer(v) => Some(*v),
            DecodedValue::Boolean(b) => Some(i64::from(*b)),
            DecodedValue::Scaled { raw, .. } => Some(*raw),
            DecodedValue::Coded { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Integer(v) => write!(f, "{}", v),
            DecodedValue::Boolean(b) => write!(f, "{}", b),
            DecodedValue::Text(s) => write!(f, "{}", s),
            DecodedValue::Time(t) => write!(f, "{}", t.format("%H:%M")),
            DecodedValue::Scaled { raw, divisor } => {
                write!(f, "{}", *raw as f64 / *divisor as f64)
            }
            DecodedValue::Coded { label, .. } => write!(f, "{}", label),
        }
    }
}

/// A value supplied by a caller for a write request
#[derive(Debug, Clone, PartialEq)]
pub enum WriteValue {
    /// Raw wire integer, sent verbatim
    Raw(i64),
    /// Display-domain number; scaled properties multiply it back up
    Number(f64),
    /// Boolean, encoded as `0`/`1`
    Boolean(bool),
    /// Verbatim text payload
    Text(String),
}

impl From<i64> for WriteValue {
    fn from(v: i64) -> Self {
        WriteValue::Raw(v)
    }
}

impl From<i32> for WriteValue {
    fn from(v: i32) -> Self {
        WriteValue::Raw(v.into())
    }
}

impl From<f64> for WriteValue {
    fn from(v: f64) -> Self {
        WriteValue::Number(v)
    }
}

impl From<bool> for WriteValue {
    fn from(v: bool) -> Self {
        WriteValue::Boolean(v)
    }
}

fn parse_int_strict(raw: &str) -> Option<i64> {
    let body = raw.strip_prefix('-').unwrap_or(raw);
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl PropertyKind {
    /// Decode a raw wire field. `None` means the field failed this type's
    /// validity check and the previous value must be kept.
    pub fn decode(&self, raw: &str) -> Option<DecodedValue> {
        match self {
            PropertyKind::Integer => parse_int_strict(raw).map(DecodedValue::Integer),
            PropertyKind::Boolean => match raw {
                "0" => Some(DecodedValue::Boolean(false)),
                "1" => Some(DecodedValue::Boolean(true)),
                _ => None,
            },
            PropertyKind::Text | PropertyKind::Opaque => {
                Some(DecodedValue::Text(raw.to_string()))
            }
            PropertyKind::Time => chrono::NaiveTime::parse_from_str(raw, "%H:%M")
                .ok()
                .map(DecodedValue::Time),
            PropertyKind::Scaled { divisor } => parse_int_strict(raw).map(|v| DecodedValue::Scaled {
                raw: v,
                divisor: *divisor,
            }),
            PropertyKind::Coded { labels } => {
                let code = parse_int_strict(raw)?;
                let label = labels.get(usize::try_from(code).ok()?)?;
                Some(DecodedValue::Coded {
                    code,
                    label: (*label).to_string(),
                })
            }
        }
    }

    /// Encode a caller-supplied value back into raw wire text.
    pub fn encode(&self, value: &WriteValue) -> Option<String> {
        let raw = match (self, value) {
            (PropertyKind::Boolean, WriteValue::Boolean(b)) => i64::from(*b),
            (PropertyKind::Boolean, WriteValue::Raw(v)) if *v == 0 || *v == 1 => *v,
            (PropertyKind::Scaled { divisor }, WriteValue::Number(n)) => {
                (n * *divisor as f64).round() as i64
            }
            (_, WriteValue::Raw(v)) => *v,
            (_, WriteValue::Number(n)) => n.round() as i64,
            (_, WriteValue::Text(s)) => return Some(s.clone()),
            _ => return None,
        };
        Some(raw.to_string())
    }

    /// Rebuild the decoded value a successful write leaves behind.
    pub fn decoded_from_raw(&self, raw: &str) -> Option<DecodedValue> {
        self.decode(raw)
    }
}

/// Write-path metadata for a writable property
#[derive(Debug, Clone)]
pub struct WriteSpec {
    /// Register number in the write command (`W<register>:<value>`)
    pub register: &'static str,
    /// Expected acknowledgment from the controller
    pub ack: AckPattern,
    /// Allowed raw range, checked before enqueueing
    pub range: Option<RangeInclusive<i64>>,
}

/// What the controller sends back for an accepted write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPattern {
    /// The value text is echoed back verbatim
    Echo,
    /// A fixed token regardless of payload
    Fixed(&'static str),
}
