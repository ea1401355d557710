//! Property descriptor table
//!
//! One declarative table maps every logical value to its register group,
//! relative offset, decode rule, and (when writable) write command
//! metadata. All decode logic lives in [`crate::registers::types`]; nothing
//! here is per-property code, so adding a register is a one-line change.
//!
//! Fields with unresolved encodings (relay bitmaps, a few flag words) are
//! deliberately `Opaque` pass-through rather than guessed.

use serde::{Deserialize, Serialize};

use super::types::{AckPattern, PropertyKind, WriteSpec};
use crate::protocol::RegisterGroup;

/// Pump status codes shared by all five jet pumps
const PUMP_STATUS: &[&str] = &["OFF", "ON", "AUTO-OFF", "AUTO-LOW", "AUTO-ON"];

/// Closed set of logical property identifiers.
///
/// Declared in the same order as [`TABLE`]; `id as usize` indexes the
/// table directly (checked by a test).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum PropertyId {
    // R2 — power and environment
    MainsCurrent,
    MainsVoltage,
    CaseTemperature,
    PortCurrent,
    ClockTime,
    HeaterRelayCycles,
    StatusFlags,

    // R3 — identity
    ModelName,
    SerialNumber,
    SoftwareVersion,
    BuildSignature,

    // R4 — modes
    OperationMode,
    LockMode,

    // R5 — live status
    WaterTemperature,
    HeaterTemperature,
    Heating,
    AutoActive,
    Sanitising,
    Sleeping,
    Cleaning,
    UvOzoneActive,
    HeatPumpActive,
    AuxElementActive,
    Pump1Status,
    Pump2Status,
    Pump3Status,
    Pump4Status,
    Pump5Status,
    BlowerStatus,
    LightsActive,
    SolarActive,
    SpaInUse,
    StatusLed,
    OutletBitmapA,
    OutletBitmapB,
    AlarmCode,
    AwakeMinutesRemaining,

    // R6 — user settings
    TargetTemperature,
    LightsOn,
    LightsBrightness,
    LightsEffect,
    LightsColour,
    LightsSpeed,
    BlowerSpeed,
    FiltrationHour,
    FiltrationInterval,
    SanitiseHour,
    HeatPumpMode,
    AuxElementEnabled,
    PowerSaveMode,
    PowerSaveStart,
    PowerSaveEnd,
    SleepTimerMode,
    SleepTimerStart,
    SleepTimerEnd,
    TimeoutDuration,
    TemperatureUnits,
    AutoEnabled,

    // R7 — installed hardware
    Pump1Installed,
    Pump2Installed,
    Pump3Installed,
    Pump4Installed,
    Pump5Installed,
    BlowerInstalled,
    HeatPumpInstalled,
    AuxElementInstalled,
    SolarInstalled,
    HeaterWattage,
    CirculationPumpInstalled,

    // R9 / RA — fault log
    LatestFaultCode,
    LatestFaultTimestamp,
    LatestFaultTemperature,
    PreviousFaultCode,
    PreviousFaultTimestamp,

    // RB — runtime counters
    Pump1Hours,
    Pump2Hours,
    Pump3Hours,
    Pump4Hours,
    Pump5Hours,
    BlowerHours,
    HeaterHours,
    UvHours,
    FiltrationHours,

    // RC — power statistics
    TotalEnergy,
    EnergyToday,
    PeakCurrent,
    HeaterDutyCycle,

    // RE — heat pump detail
    AmbientTemperature,
    CondensorTemperature,
    CompressorActive,
    FanActive,

    // RG — install states and locks
    Pump1InstallState,
    Pump2InstallState,
    Pump3InstallState,
    Pump4InstallState,
    Pump5InstallState,
    LockPin,
    RemoteLockFlags,
}

impl PropertyId {
    /// Stable snake_case name, used for logs and by collaborators for
    /// topic/entity naming
    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Static metadata for this property
    pub fn descriptor(&self) -> &'static PropertyDescriptor {
        &TABLE[*self as usize]
    }

    /// Iterate all known properties in table order
    pub fn all() -> impl Iterator<Item = PropertyId> {
        TABLE.iter().map(|d| d.id)
    }
}

/// Static metadata for one logical property
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Identifier, equal to this entry's table index
    pub id: PropertyId,
    /// Stable snake_case name
    pub name: &'static str,
    /// Owning register group
    pub group: RegisterGroup,
    /// Offset relative to the group tag (first data field is 0)
    pub offset: usize,
    /// Decode rule
    pub kind: PropertyKind,
    /// Write metadata; `None` means read-only
    pub write: Option<WriteSpec>,
}

macro_rules! prop {
    ($id:ident, $name:literal, $group:ident, $offset:expr, $kind:expr) => {
        PropertyDescriptor {
            id: PropertyId::$id,
            name: $name,
            group: RegisterGroup::$group,
            offset: $offset,
            kind: $kind,
            write: None,
        }
    };
    ($id:ident, $name:literal, $group:ident, $offset:expr, $kind:expr, $reg:literal, $ack:expr, $range:expr) => {
        PropertyDescriptor {
            id: PropertyId::$id,
            name: $name,
            group: RegisterGroup::$group,
            offset: $offset,
            kind: $kind,
            write: Some(WriteSpec {
                register: $reg,
                ack: $ack,
                range: $range,
            }),
        }
    };
}

use AckPattern::{Echo, Fixed};
use PropertyKind::{Boolean, Coded, Integer, Opaque, Scaled, Text, Time};

/// The full property table, one entry per logical value.
pub static TABLE: &[PropertyDescriptor] = &[
    // R2 — power and environment
    prop!(MainsCurrent, "mains_current", R2, 0, Scaled { divisor: 10 }),
    prop!(MainsVoltage, "mains_voltage", R2, 1, Integer),
    prop!(CaseTemperature, "case_temperature", R2, 2, Scaled { divisor: 10 }),
    prop!(PortCurrent, "port_current", R2, 3, Scaled { divisor: 10 }),
    prop!(ClockTime, "clock_time", R2, 4, Time, "41", Fixed("OK"), None),
    prop!(HeaterRelayCycles, "heater_relay_cycles", R2, 6, Integer),
    prop!(StatusFlags, "status_flags", R2, 7, Opaque),
    // R3 — identity
    prop!(ModelName, "model_name", R3, 0, Text),
    prop!(SerialNumber, "serial_number", R3, 1, Text),
    prop!(SoftwareVersion, "software_version", R3, 2, Text),
    prop!(BuildSignature, "build_signature", R3, 4, Opaque),
    // R4 — modes
    prop!(
        OperationMode,
        "operation_mode",
        R4,
        0,
        Coded { labels: &["NORM", "ECON", "AWAY", "WEEK"] },
        "66",
        Echo,
        Some(0..=3)
    ),
    prop!(
        LockMode,
        "lock_mode",
        R4,
        1,
        Coded { labels: &["OFF", "PARTIAL", "FULL"] },
        "361",
        Echo,
        Some(0..=2)
    ),
    // R5 — live status
    prop!(WaterTemperature, "water_temperature", R5, 0, Scaled { divisor: 10 }),
    prop!(HeaterTemperature, "heater_temperature", R5, 1, Scaled { divisor: 10 }),
    prop!(Heating, "heating", R5, 2, Boolean),
    prop!(AutoActive, "auto_active", R5, 3, Boolean),
    prop!(Sanitising, "sanitising", R5, 4, Boolean),
    prop!(Sleeping, "sleeping", R5, 5, Boolean),
    prop!(Cleaning, "cleaning", R5, 6, Boolean),
    prop!(UvOzoneActive, "uv_ozone_active", R5, 7, Boolean),
    prop!(HeatPumpActive, "heat_pump_active", R5, 8, Boolean),
    prop!(AuxElementActive, "aux_element_active", R5, 9, Boolean),
    prop!(Pump1Status, "pump1_status", R5, 10, Coded { labels: PUMP_STATUS }, "104", Echo, Some(0..=4)),
    prop!(Pump2Status, "pump2_status", R5, 11, Coded { labels: PUMP_STATUS }, "105", Echo, Some(0..=4)),
    prop!(Pump3Status, "pump3_status", R5, 12, Coded { labels: PUMP_STATUS }, "106", Echo, Some(0..=4)),
    prop!(Pump4Status, "pump4_status", R5, 13, Coded { labels: PUMP_STATUS }, "107", Echo, Some(0..=4)),
    prop!(Pump5Status, "pump5_status", R5, 14, Coded { labels: PUMP_STATUS }, "108", Echo, Some(0..=4)),
    prop!(
        BlowerStatus,
        "blower_status",
        R5,
        15,
        Coded { labels: &["OFF", "RAMP", "VARIABLE"] },
        "109",
        Echo,
        Some(0..=2)
    ),
    prop!(LightsActive, "lights_active", R5, 16, Boolean),
    prop!(SolarActive, "solar_active", R5, 17, Boolean),
    prop!(SpaInUse, "spa_in_use", R5, 18, Boolean),
    prop!(StatusLed, "status_led", R5, 20, Opaque),
    prop!(OutletBitmapA, "outlet_bitmap_a", R5, 21, Opaque),
    prop!(OutletBitmapB, "outlet_bitmap_b", R5, 22, Opaque),
    prop!(AlarmCode, "alarm_code", R5, 23, Integer),
    prop!(AwakeMinutesRemaining, "awake_minutes_remaining", R5, 25, Integer),
    // R6 — user settings
    prop!(
        TargetTemperature,
        "target_temperature",
        R6,
        0,
        Scaled { divisor: 10 },
        "40",
        Echo,
        Some(50..=410)
    ),
    prop!(LightsOn, "lights_on", R6, 1, Boolean, "14", Echo, Some(0..=1)),
    prop!(LightsBrightness, "lights_brightness", R6, 2, Integer, "09", Echo, Some(1..=5)),
    prop!(
        LightsEffect,
        "lights_effect",
        R6,
        3,
        Coded { labels: &["WHITE", "COLOUR", "FADE", "STEP", "PARTY"] },
        "90",
        Echo,
        Some(0..=4)
    ),
    prop!(LightsColour, "lights_colour", R6, 4, Integer, "10", Echo, Some(0..=30)),
    prop!(LightsSpeed, "lights_speed", R6, 5, Integer, "73", Echo, Some(1..=5)),
    prop!(BlowerSpeed, "blower_speed", R6, 6, Integer, "24", Echo, Some(1..=5)),
    prop!(FiltrationHour, "filtration_hour", R6, 7, Integer, "12", Echo, Some(0..=23)),
    prop!(FiltrationInterval, "filtration_interval", R6, 8, Integer, "60", Echo, Some(1..=24)),
    prop!(SanitiseHour, "sanitise_hour", R6, 9, Integer, "72", Echo, Some(0..=23)),
    prop!(
        HeatPumpMode,
        "heat_pump_mode",
        R6,
        10,
        Coded { labels: &["AUTO", "HEAT", "COOL", "OFF"] },
        "99",
        Echo,
        Some(0..=3)
    ),
    prop!(AuxElementEnabled, "aux_element_enabled", R6, 11, Boolean, "98", Echo, Some(0..=1)),
    prop!(
        PowerSaveMode,
        "power_save_mode",
        R6,
        12,
        Coded { labels: &["OFF", "LOW", "HIGH"] },
        "63",
        Echo,
        Some(0..=2)
    ),
    prop!(PowerSaveStart, "power_save_start", R6, 13, Integer, "64", Echo, Some(0..=2359)),
    prop!(PowerSaveEnd, "power_save_end", R6, 14, Integer, "65", Echo, Some(0..=2359)),
    prop!(SleepTimerMode, "sleep_timer_mode", R6, 15, Opaque),
    prop!(SleepTimerStart, "sleep_timer_start", R6, 16, Integer, "68", Echo, Some(0..=2359)),
    prop!(SleepTimerEnd, "sleep_timer_end", R6, 17, Integer, "69", Echo, Some(0..=2359)),
    prop!(TimeoutDuration, "timeout_duration", R6, 18, Integer, "54", Echo, Some(10..=60)),
    prop!(
        TemperatureUnits,
        "temperature_units",
        R6,
        20,
        Coded { labels: &["CELSIUS", "FAHRENHEIT"] }
    ),
    prop!(AutoEnabled, "auto_enabled", R6, 21, Boolean, "75", Echo, Some(0..=1)),
    // R7 — installed hardware
    prop!(Pump1Installed, "pump1_installed", R7, 0, Boolean),
    prop!(Pump2Installed, "pump2_installed", R7, 1, Boolean),
    prop!(Pump3Installed, "pump3_installed", R7, 2, Boolean),
    prop!(Pump4Installed, "pump4_installed", R7, 3, Boolean),
    prop!(Pump5Installed, "pump5_installed", R7, 4, Boolean),
    prop!(BlowerInstalled, "blower_installed", R7, 5, Boolean),
    prop!(HeatPumpInstalled, "heat_pump_installed", R7, 6, Boolean),
    prop!(AuxElementInstalled, "aux_element_installed", R7, 7, Boolean),
    prop!(SolarInstalled, "solar_installed", R7, 8, Boolean),
    prop!(HeaterWattage, "heater_wattage", R7, 9, Integer),
    prop!(CirculationPumpInstalled, "circulation_pump_installed", R7, 10, Boolean),
    // R9 / RA — fault log
    prop!(LatestFaultCode, "latest_fault_code", R9, 0, Integer),
    prop!(LatestFaultTimestamp, "latest_fault_timestamp", R9, 1, Opaque),
    prop!(LatestFaultTemperature, "latest_fault_temperature", R9, 2, Scaled { divisor: 10 }),
    prop!(PreviousFaultCode, "previous_fault_code", RA, 0, Integer),
    prop!(PreviousFaultTimestamp, "previous_fault_timestamp", RA, 1, Opaque),
    // RB — runtime counters
    prop!(Pump1Hours, "pump1_hours", RB, 0, Integer),
    prop!(Pump2Hours, "pump2_hours", RB, 1, Integer),
    prop!(Pump3Hours, "pump3_hours", RB, 2, Integer),
    prop!(Pump4Hours, "pump4_hours", RB, 3, Integer),
    prop!(Pump5Hours, "pump5_hours", RB, 4, Integer),
    prop!(BlowerHours, "blower_hours", RB, 5, Integer),
    prop!(HeaterHours, "heater_hours", RB, 6, Integer),
    prop!(UvHours, "uv_hours", RB, 7, Integer),
    prop!(FiltrationHours, "filtration_hours", RB, 8, Integer),
    // RC — power statistics
    prop!(TotalEnergy, "total_energy", RC, 0, Scaled { divisor: 10 }),
    prop!(EnergyToday, "energy_today", RC, 1, Scaled { divisor: 10 }),
    prop!(PeakCurrent, "peak_current", RC, 2, Scaled { divisor: 10 }),
    prop!(HeaterDutyCycle, "heater_duty_cycle", RC, 5, Opaque),
    // RE — heat pump detail
    prop!(AmbientTemperature, "ambient_temperature", RE, 0, Scaled { divisor: 10 }),
    prop!(CondensorTemperature, "condensor_temperature", RE, 1, Scaled { divisor: 10 }),
    prop!(CompressorActive, "compressor_active", RE, 2, Boolean),
    prop!(FanActive, "fan_active", RE, 3, Boolean),
    // RG — install states and locks
    prop!(Pump1InstallState, "pump1_install_state", RG, 0, Text),
    prop!(Pump2InstallState, "pump2_install_state", RG, 1, Text),
    prop!(Pump3InstallState, "pump3_install_state", RG, 2, Text),
    prop!(Pump4InstallState, "pump4_install_state", RG, 3, Text),
    prop!(Pump5InstallState, "pump5_install_state", RG, 4, Text),
    prop!(LockPin, "lock_pin", RG, 5, Opaque),
    prop!(RemoteLockFlags, "remote_lock_flags", RG, 6, Opaque),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_match_table_order() {
        for (i, desc) in TABLE.iter().enumerate() {
            assert_eq!(desc.id as usize, i, "table order broken at {}", desc.name);
        }
    }

    #[test]
    fn test_names_unique() {
        let mut seen = HashSet::new();
        for desc in TABLE {
            assert!(seen.insert(desc.name), "duplicate name {}", desc.name);
        }
    }

    #[test]
    fn test_write_registers_unique() {
        let mut seen = HashSet::new();
        for desc in TABLE {
            if let Some(w) = &desc.write {
                assert!(seen.insert(w.register), "duplicate register {}", w.register);
            }
        }
    }

    #[test]
    fn test_offsets_within_group_minimums() {
        for desc in TABLE {
            assert!(
                desc.offset < desc.group.min_fields(),
                "{} offset {} outside group {} minimum {}",
                desc.name,
                desc.offset,
                desc.group.tag(),
                desc.group.min_fields()
            );
        }
    }

    #[test]
    fn test_descriptor_lookup() {
        let desc = PropertyId::TargetTemperature.descriptor();
        assert_eq!(desc.group, RegisterGroup::R6);
        assert_eq!(desc.offset, 0);
        let write = desc.write.as_ref().unwrap();
        assert_eq!(write.register, "40");
        assert_eq!(write.ack, AckPattern::Echo);
        assert!(write.range.as_ref().unwrap().contains(&215));
    }
}
