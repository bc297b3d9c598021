//! Build script for railclock-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates clock.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sections the firmware reader accepts
const SECTIONS: &[&str] = &["drive", "track", "speed", "timing", "axis", "status", "clock", "bridge"];

/// Axis tables under `[axis.*]`
const AXES: &[&str] = &["hour", "minute"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate clock.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=clock.toml");

    let config_path = Path::new("clock.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: clock.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds clock.toml at build time.                   ║\n\
            ║  Please create one in the railclock-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read clock.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in clock.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_drive(&config, &mut errors);
    validate_track(&config, &mut errors);
    validate_speeds(&config, &mut errors);
    validate_timing(&config, &mut errors);
    validate_axes(&config, &mut errors);
    validate_clock(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid clock configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=clock.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn table<'a>(config: &'a toml::Value, name: &str) -> Option<&'a toml::value::Table> {
    config.get(name).and_then(|v| v.as_table())
}

/// Integer under `[section] key`, if present
///
/// Wrong types are reported here so the range checks can skip them.
fn integer(
    config: &toml::Value,
    section: &str,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<i64> {
    match table(config, section)?.get(key)? {
        toml::Value::Integer(n) => Some(*n),
        _ => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
    }
}

fn require_positive(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) {
    if let Some(n) = integer(config, section, key, errors) {
        if n <= 0 || n > i64::from(u32::MAX) {
            errors.push(format!("[{}] {} must be 1-{}", section, key, u32::MAX));
        }
    }
}

/// Reject sections the firmware reader would refuse at boot
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, value) in root {
        if !SECTIONS.contains(&name.as_str()) {
            errors.push(format!("unknown section [{}]", name));
            continue;
        }
        if !value.is_table() {
            errors.push(format!("[{}] must be a table", name));
        }
    }

    if let Some(axes) = table(config, "axis") {
        for name in axes.keys() {
            if !AXES.contains(&name.as_str()) {
                errors.push(format!("unknown section [axis.{}]", name));
            }
        }
    }
}

fn validate_drive(config: &toml::Value, errors: &mut Vec<String>) {
    for key in ["timer_resolution_hz", "full_steps_per_rev", "microsteps", "travel_per_rev_um"] {
        require_positive(config, "drive", key, errors);
    }
}

/// Check the dial fits between the switches
///
/// Defaults mirror the reference build so a partial `[track]` is checked
/// against the values the firmware will actually use.
fn validate_track(config: &toml::Value, errors: &mut Vec<String>) {
    let mut get = |key, default| integer(config, "track", key, errors).unwrap_or(default);
    let home = get("home_mm", 10);
    let start = get("start_mm", 35);
    let length = get("length_mm", 600);
    let right_limit = get("right_limit_mm", 660);
    let seek = get("seek_mm", 700);

    if home < 0 {
        errors.push("[track] home_mm must not be negative".to_string());
    }
    if start < home {
        errors.push("[track] start_mm must not be before home_mm".to_string());
    }
    if length <= 0 {
        errors.push("[track] length_mm must be positive".to_string());
    }
    if start + length > right_limit {
        errors.push("[track] start_mm + length_mm runs past right_limit_mm".to_string());
    }
    if seek < right_limit {
        errors.push("[track] seek_mm must be at least right_limit_mm".to_string());
    }
}

fn validate_speeds(config: &toml::Value, errors: &mut Vec<String>) {
    for key in [
        "homing_hz",
        "set_time_hz",
        "normal_hz",
        "minute_hz",
        "minute_return_hz",
        "hour_advance_hz",
        "hour_slow_hz",
    ] {
        require_positive(config, "speed", key, errors);
    }
}

fn validate_timing(config: &toml::Value, errors: &mut Vec<String>) {
    for key in ["settle_ms", "event_timeout_ms", "poll_interval_ms"] {
        require_positive(config, "timing", key, errors);
    }
    for key in ["long_pause_ms", "short_pause_ms"] {
        if let Some(n) = integer(config, "timing", key, errors) {
            if n < 0 {
                errors.push(format!("[timing] {} must not be negative", key));
            }
        }
    }
}

fn validate_axes(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(axes) = table(config, "axis") else {
        return;
    };

    for (name, axis) in axes {
        let Some(axis) = axis.as_table() else {
            errors.push(format!("[axis.{}] must be a table", name));
            continue;
        };
        for key in ["enable_active_low", "limit_active_low", "forward_is_increasing"] {
            if let Some(value) = axis.get(key) {
                if !value.is_bool() {
                    errors.push(format!("[axis.{}] {} must be true or false", name, key));
                }
            }
        }
    }

    if let Some(value) = table(config, "status").and_then(|t| t.get("active_low")) {
        if !value.is_bool() {
            errors.push("[status] active_low must be true or false".to_string());
        }
    }
}

fn validate_clock(config: &toml::Value, errors: &mut Vec<String>) {
    require_positive(config, "bridge", "baud_rate", errors);

    let Some(clock) = table(config, "clock") else {
        return;
    };
    let offset = clock.get("utc_offset").or_else(|| clock.get("utc_offset_minutes"));

    let minutes = match offset {
        None => return,
        Some(toml::Value::Integer(n)) => Some(*n),
        Some(toml::Value::String(s)) => parse_offset(s),
        Some(_) => None,
    };

    match minutes {
        Some(m) if m.abs() <= 18 * 60 => {}
        Some(_) => errors.push("[clock] utc_offset must be within ±18:00".to_string()),
        None => errors.push("[clock] utc_offset must be minutes or \"+HH:MM\"".to_string()),
    }
}

/// `"+HH:MM"` / `"-HH:MM"` to signed minutes
fn parse_offset(s: &str) -> Option<i64> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => (1, s),
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i64 = hours.parse().ok()?;
    let minutes: i64 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some(sign * (hours * 60 + minutes))
}
