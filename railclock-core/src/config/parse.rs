//! Minimal TOML reader for the clock configuration
//!
//! Handles the small subset the clock file uses:
//! - `[section]` and `[section.subsection]` headers
//! - `key = value` pairs with integer, boolean or quoted string values
//! - `#` comments, whole-line or trailing
//!
//! Unknown keys are ignored so older firmware accepts newer files. Unknown
//! sections are rejected, since they usually mean a typo that would silently
//! drop a whole block of settings.

use super::types::{AxisHwConfig, ClockConfig, ConfigError, SpeedProfile};

/// What went wrong while reading the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Section header not recognised
    InvalidSection,
    /// Line is not `key = value`
    InvalidLine,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// File parsed but the settings are inconsistent
    Invalid(ConfigError),
}

/// Parse failure with its 1-based line number (0 for whole-file checks)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Drive,
    Track,
    Speed,
    Timing,
    HourAxis,
    MinuteAxis,
    Status,
    Clock,
    Bridge,
}

/// Parse and validate a clock configuration file
pub fn parse_config(input: &str) -> Result<ClockConfig, ParseError> {
    let mut config = ClockConfig::default();
    let mut section = Section::Root;
    let mut explicit_hour_advance = false;

    for (index, raw) in input.lines().enumerate() {
        let line = strip_comment(raw).trim();
        let fail = |kind| ParseError {
            line: index + 1,
            kind,
        };

        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let header = header
                .strip_suffix(']')
                .ok_or(fail(ParseErrorKind::InvalidSection))?;
            section = parse_section_header(header).ok_or(fail(ParseErrorKind::InvalidSection))?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(fail(ParseErrorKind::InvalidLine))?;
        if section == Section::Speed && key == "hour_advance_hz" {
            explicit_hour_advance = true;
        }
        apply_value(&mut config, section, key, value).map_err(fail)?;
    }

    if !explicit_hour_advance {
        config.speeds.hour_advance_hz =
            SpeedProfile::hour_advance_for(config.speeds.minute_return_hz);
    }

    config.validate().map_err(|err| ParseError {
        line: 0,
        kind: ParseErrorKind::Invalid(err),
    })?;

    Ok(config)
}

fn parse_section_header(header: &str) -> Option<Section> {
    let section = match header.trim() {
        "drive" => Section::Drive,
        "track" => Section::Track,
        "speed" => Section::Speed,
        "timing" => Section::Timing,
        "axis.hour" => Section::HourAxis,
        "axis.minute" => Section::MinuteAxis,
        "status" => Section::Status,
        "clock" => Section::Clock,
        "bridge" => Section::Bridge,
        _ => return None,
    };
    Some(section)
}

/// Drop a trailing comment, leaving `#` inside quotes alone
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseErrorKind> {
    // TOML allows `_` as a digit separator
    let mut digits = heapless::String::<24>::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseErrorKind::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseErrorKind::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseErrorKind> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseErrorKind::InvalidValue),
    }
}

/// Parse `"+09:00"`, `"-05:30"` or a plain minute count
fn parse_utc_offset(value: &str) -> Result<i16, ParseErrorKind> {
    let text = unquote(value);
    let Some((hours, minutes)) = text.split_once(':') else {
        return parse_int(text);
    };
    let negative = hours.starts_with('-');
    let hours: i16 = parse_int(hours.trim_start_matches(['+', '-']))?;
    let minutes: i16 = parse_int(minutes)?;
    if minutes >= 60 {
        return Err(ParseErrorKind::InvalidValue);
    }
    let total = hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .ok_or(ParseErrorKind::InvalidValue)?;
    Ok(if negative { -total } else { total })
}

fn apply_value(
    config: &mut ClockConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseErrorKind> {
    match section {
        Section::Drive => {
            let drive = &mut config.drive;
            match key {
                "timer_resolution_hz" => drive.timer_resolution_hz = parse_int(value)?,
                "full_steps_per_rev" => drive.full_steps_per_rev = parse_int(value)?,
                "microsteps" => drive.microsteps = parse_int(value)?,
                "travel_per_rev_um" => drive.travel_per_rev_um = parse_int(value)?,
                _ => {}
            }
        }
        Section::Track => {
            let track = &mut config.track;
            match key {
                "home_mm" => track.home_mm = parse_int(value)?,
                "start_mm" => track.start_mm = parse_int(value)?,
                "length_mm" => track.length_mm = parse_int(value)?,
                "right_limit_mm" => track.right_limit_mm = parse_int(value)?,
                "seek_mm" => track.seek_mm = parse_int(value)?,
                _ => {}
            }
        }
        Section::Speed => {
            let speeds = &mut config.speeds;
            match key {
                "homing_hz" => speeds.homing_hz = parse_int(value)?,
                "set_time_hz" => speeds.set_time_hz = parse_int(value)?,
                "normal_hz" => speeds.normal_hz = parse_int(value)?,
                "minute_hz" => speeds.minute_hz = parse_int(value)?,
                "minute_return_hz" => speeds.minute_return_hz = parse_int(value)?,
                "hour_advance_hz" => speeds.hour_advance_hz = parse_int(value)?,
                "hour_slow_hz" => speeds.hour_slow_hz = parse_int(value)?,
                _ => {}
            }
        }
        Section::Timing => {
            let timing = &mut config.timing;
            match key {
                "settle_ms" => timing.settle_ms = parse_int(value)?,
                "event_timeout_ms" => timing.event_timeout_ms = parse_int(value)?,
                "poll_interval_ms" => timing.poll_interval_ms = parse_int(value)?,
                "long_pause_ms" => timing.long_pause_ms = parse_int(value)?,
                "short_pause_ms" => timing.short_pause_ms = parse_int(value)?,
                _ => {}
            }
        }
        Section::HourAxis => apply_axis(&mut config.hour_axis, key, value)?,
        Section::MinuteAxis => apply_axis(&mut config.minute_axis, key, value)?,
        Section::Status => {
            if key == "active_low" {
                config.status.active_low = parse_bool(value)?;
            }
        }
        Section::Clock => {
            if key == "utc_offset_minutes" || key == "utc_offset" {
                config.utc_offset_minutes = parse_utc_offset(value)?;
            }
        }
        Section::Bridge => {
            if key == "baud_rate" {
                config.bridge.baud_rate = parse_int(value)?;
            }
        }
        Section::Root => {}
    }
    Ok(())
}

fn apply_axis(axis: &mut AxisHwConfig, key: &str, value: &str) -> Result<(), ParseErrorKind> {
    match key {
        "enable_active_low" => axis.enable_active_low = parse_bool(value)?,
        "limit_active_low" => axis.limit_active_low = parse_bool(value)?,
        "forward_is_increasing" => axis.forward_is_increasing = parse_bool(value)?,
        _ => {}
    }
    Ok(())
}
