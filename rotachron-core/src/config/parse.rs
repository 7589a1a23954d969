//! Minimal TOML parser for clock configuration
//!
//! Handles only the subset the clock needs and does NOT implement the full
//! TOML spec. Works on borrowed `&str` without allocation.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] and [section.name] headers
//! - Comments (# ...), including trailing comments
//!
//! Unknown keys are ignored so newer config files still load.

use crate::display::AxisId;

use super::types::{AxisHwConfig, ClockConfig, HourMode, PinConfig};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header, with its 1-based line
    InvalidSection(usize),
    /// Line is neither a header nor `key = value`
    InvalidLine(usize),
    /// Value has the wrong type or is out of range
    InvalidValue(usize),
    /// Invalid pin string
    InvalidPin(usize),
    /// The same axis section appears twice
    DuplicateAxis(AxisId),
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Geometry,
    Motion,
    Axis(AxisId),
    Microstep,
    Time,
    Link,
}

/// Parse TOML configuration into a `ClockConfig`
///
/// Missing keys keep their defaults; missing axes are left unset and
/// reported by [`ClockConfig::validate`].
pub fn parse_config(input: &str) -> Result<ClockConfig, ParseError> {
    let mut config = ClockConfig::new();
    let mut section = Section::Root;

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = strip_comment(line)
                .strip_prefix('[')
                .and_then(|h| h.strip_suffix(']'))
                .ok_or(ParseError::InvalidSection(line_no))?;
            section = parse_section_header(header).ok_or(ParseError::InvalidSection(line_no))?;

            if let Section::Axis(axis) = section {
                let slot = &mut config.axes[axis.index()];
                if slot.is_some() {
                    return Err(ParseError::DuplicateAxis(axis));
                }
                *slot = Some(AxisHwConfig::default());
            }
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine(line_no))?;
        apply_value(&mut config, section, key, value).map_err(|e| e.at(line_no))?;
    }

    Ok(config)
}

/// Value error without position, tagged by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueError {
    Value,
    Pin,
}

impl ValueError {
    fn at(self, line_no: usize) -> ParseError {
        match self {
            ValueError::Value => ParseError::InvalidValue(line_no),
            ValueError::Pin => ParseError::InvalidPin(line_no),
        }
    }
}

/// Parse section header like "motion" or "axis.hour_tens"
fn parse_section_header(header: &str) -> Option<Section> {
    let header = header.trim();

    if let Some(name) = header.strip_prefix("axis.") {
        return AxisId::from_name(name.trim()).map(Section::Axis);
    }

    match header {
        "geometry" => Some(Section::Geometry),
        "motion" => Some(Section::Motion),
        "microstep" => Some(Section::Microstep),
        "time" => Some(Section::Time),
        "link" => Some(Section::Link),
        _ => None,
    }
}

fn apply_value(
    config: &mut ClockConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ValueError> {
    match section {
        Section::Root => {
            if key == "version" {
                config.version = parse_int(value)?;
            }
        }
        Section::Geometry => {
            let g = &mut config.geometry;
            match key {
                "full_steps_per_rev" => g.full_steps_per_rev = parse_int(value)?,
                "microsteps" => g.microsteps = parse_int(value)?,
                "centidegrees_per_digit" => g.centidegrees_per_digit = parse_int(value)?,
                _ => {}
            }
        }
        Section::Motion => {
            let m = &mut config.motion;
            match key {
                "max_speed" => m.max_speed = parse_int(value)?,
                "acceleration" => m.acceleration = parse_int(value)?,
                "move_poll_us" => m.move_poll_us = parse_int(value)?,
                "idle_poll_us" => m.idle_poll_us = parse_int(value)?,
                "pulse_width_ns" => m.pulse_width_ns = parse_int(value)?,
                "release_when_idle" => m.release_when_idle = parse_bool(value)?,
                _ => {}
            }
        }
        Section::Axis(axis) => {
            let Some(hw) = config.axes[axis.index()].as_mut() else {
                return Ok(());
            };
            match key {
                "step_pin" => hw.step_pin = parse_pin(value)?,
                "dir_pin" => hw.dir_pin = parse_pin(value)?,
                "enable_pin" => hw.enable_pin = Some(parse_pin(value)?),
                _ => {}
            }
        }
        Section::Microstep => {
            let pins = &mut config.microstep_pins;
            match key {
                "ms1" => pins.ms1 = Some(parse_pin(value)?),
                "ms2" => pins.ms2 = Some(parse_pin(value)?),
                "ms3" => pins.ms3 = Some(parse_pin(value)?),
                _ => {}
            }
        }
        Section::Time => {
            let t = &mut config.time;
            match key {
                "utc_offset_minutes" => t.utc_offset_minutes = parse_int(value)?,
                "hour_mode" => t.hour_mode = parse_hour_mode(value)?,
                "blank_leading_zero" => t.blank_leading_zero = parse_bool(value)?,
                "recovery_window_s" => t.recovery_window_s = parse_int(value)?,
                _ => {}
            }
        }
        Section::Link => {
            let l = &mut config.link;
            match key {
                "baud_rate" => l.baud_rate = parse_int(value)?,
                _ => {}
            }
        }
    }
    Ok(())
}

/// Remove a trailing comment that is not inside a string
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(hash_pos) if line[..hash_pos].matches('"').count() % 2 == 0 => {
            line[..hash_pos].trim_end()
        }
        _ => line,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = strip_comment(line[eq_pos + 1..].trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ValueError> {
    let value = parse_string(value);
    let value = value.strip_prefix('+').unwrap_or(value);
    value.parse().map_err(|_| ValueError::Value)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ValueError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValueError::Value),
    }
}

/// Parse hour mode: 12 or 24
fn parse_hour_mode(value: &str) -> Result<HourMode, ValueError> {
    match parse_string(value) {
        "12" => Ok(HourMode::Twelve),
        "24" => Ok(HourMode::TwentyFour),
        _ => Err(ValueError::Value),
    }
}

/// Parse a pin string like "gpio11" or "!gpio12"; bare numbers are accepted
fn parse_pin(value: &str) -> Result<PinConfig, ValueError> {
    let value = parse_string(value);
    let (inverted, s) = match value.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let digits = s.strip_prefix("gpio").unwrap_or(s);

    let pin: u8 = digits.parse().map_err(|_| ValueError::Pin)?;
    Ok(PinConfig { pin, inverted })
}
