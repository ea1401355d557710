//! Demo mode - simulated spa controller for testing
//!
//! An in-process SV3 controller implementing [`Transport`], so the full
//! engine can run without hardware. Answers status polls with a
//! well-formed frame, applies and echoes accepted writes, and jitters the
//! water temperature so change listeners have something to see.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;

use crate::protocol::{
    LinkStats, ProtocolError, RegisterGroup, Transport, FRAME_MARKER, POLL_COMMAND, WRITE_OPCODE,
};
use crate::registers::{AckPattern, PropertyId, TABLE};

/// Extra padding fields SV3 firmware carries beyond the group minimums
const SV3_EXTRA: [(RegisterGroup, usize); 2] = [(RegisterGroup::R5, 8), (RegisterGroup::R6, 6)];

/// Simulated SV3 spa controller
pub struct DemoController {
    /// Data fields per group, indexed by `RegisterGroup::index()`
    groups: Vec<Vec<String>>,
    /// Bytes queued for the engine to read
    output: VecDeque<u8>,
    /// Partial command line received from the engine
    input: Vec<u8>,
    rng: StdRng,
    stats: LinkStats,
}

impl DemoController {
    /// Create a controller with plausible defaults and a random seed
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a controller with a fixed seed for deterministic tests
    pub fn with_seed(seed: u64) -> Self {
        let mut groups: Vec<Vec<String>> = RegisterGroup::ALL
            .iter()
            .map(|g| {
                let extra = SV3_EXTRA
                    .iter()
                    .find(|(eg, _)| eg == g)
                    .map(|(_, n)| *n)
                    .unwrap_or(0);
                vec!["0".to_string(); g.min_fields() + extra]
            })
            .collect();

        for desc in TABLE {
            let default = match desc.id {
                PropertyId::ModelName => "SV3",
                PropertyId::SerialNumber => "SN120467",
                PropertyId::SoftwareVersion => "V3 21",
                PropertyId::ClockTime => "12:00",
                PropertyId::MainsVoltage => "240",
                PropertyId::MainsCurrent => "18",
                PropertyId::CaseTemperature => "251",
                PropertyId::WaterTemperature => "362",
                PropertyId::HeaterTemperature => "370",
                PropertyId::TargetTemperature => "380",
                PropertyId::Heating => "1",
                PropertyId::Pump1Installed => "1",
                PropertyId::Pump2Installed => "1",
                PropertyId::BlowerInstalled => "1",
                PropertyId::HeaterWattage => "2900",
                PropertyId::LightsBrightness => "3",
                PropertyId::LightsSpeed => "2",
                PropertyId::BlowerSpeed => "1",
                PropertyId::FiltrationInterval => "4",
                PropertyId::FiltrationHour => "8",
                PropertyId::SanitiseHour => "9",
                PropertyId::TimeoutDuration => "30",
                PropertyId::Pump1InstallState
                | PropertyId::Pump2InstallState
                | PropertyId::Pump3InstallState
                | PropertyId::Pump4InstallState
                | PropertyId::Pump5InstallState => "1-1-014",
                _ => continue,
            };
            groups[desc.group.index()][desc.offset] = default.to_string();
        }

        Self {
            groups,
            output: VecDeque::new(),
            input: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            stats: LinkStats::default(),
        }
    }

    /// Overwrite one property's raw field (test hook)
    pub fn set_property_raw(&mut self, id: PropertyId, raw: &str) {
        let desc = id.descriptor();
        self.groups[desc.group.index()][desc.offset] = raw.to_string();
    }

    fn handle_line(&mut self, line: &str) {
        let line = line.trim_end();
        if line == POLL_COMMAND.trim_end() {
            self.jitter();
            self.render_frame();
            return;
        }
        if let Some(rest) = line.strip_prefix(WRITE_OPCODE) {
            self.handle_write(rest);
        }
    }

    fn handle_write(&mut self, rest: &str) {
        let Some((register, value)) = rest.split_once(':') else {
            self.reply("ERR");
            return;
        };

        let Some((desc, write)) = TABLE.iter().find_map(|d| {
            d.write
                .as_ref()
                .filter(|w| w.register == register)
                .map(|w| (d, w))
        }) else {
            self.reply("ERR");
            return;
        };

        if let Some(range) = &write.range {
            match value.parse::<i64>() {
                Ok(v) if range.contains(&v) => {}
                _ => {
                    self.reply("ERR");
                    return;
                }
            }
        }

        self.groups[desc.group.index()][desc.offset] = value.to_string();
        match write.ack {
            AckPattern::Echo => self.reply(value),
            AckPattern::Fixed(token) => self.reply(token),
        }
    }

    fn reply(&mut self, text: &str) {
        self.output.extend(text.as_bytes());
        self.output.push_back(b'\r');
    }

    fn jitter(&mut self) {
        let desc = PropertyId::WaterTemperature.descriptor();
        let field = &mut self.groups[desc.group.index()][desc.offset];
        if let Ok(raw) = field.parse::<i64>() {
            let wobble: i64 = self.rng.gen_range(-3..=3);
            *field = (raw + wobble).clamp(300, 420).to_string();
        }
    }

    fn render_frame(&mut self) {
        let mut fields: Vec<&str> = vec![FRAME_MARKER];
        for group in &RegisterGroup::ALL {
            fields.push(group.tag());
            for value in &self.groups[group.index()] {
                fields.push(value.as_str());
            }
        }
        let body = fields.join(",");
        self.output.extend(body.as_bytes());
        // Trailing tail after the last group, flushed by the reader
        self.output.extend(b",*\n");
    }
}

impl Default for DemoController {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for DemoController {
    fn read_until(&mut self, delimiter: u8, _timeout: Duration) -> Result<Vec<u8>, ProtocolError> {
        let Some(pos) = self.output.iter().position(|b| *b == delimiter) else {
            return Err(ProtocolError::Timeout);
        };
        let mut field = Vec::with_capacity(pos);
        for _ in 0..pos {
            field.push(self.output.pop_front().unwrap_or_default());
        }
        self.output.pop_front(); // the delimiter itself
        self.stats.rx_bytes += pos as u64 + 1;
        Ok(field)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.stats.tx_bytes += bytes.len() as u64;
        for &b in bytes {
            if b == b'\n' {
                let line = String::from_utf8_lossy(&self.input).to_string();
                self.input.clear();
                self.handle_line(&line);
            } else {
                self.input.push(b);
            }
        }
        Ok(())
    }

    fn flush_input(&mut self) -> Result<usize, ProtocolError> {
        let discarded = self.output.len();
        self.output.clear();
        self.stats.rx_bytes += discarded as u64;
        Ok(discarded)
    }

    fn stats(&self) -> LinkStats {
        self.stats
    }
}
