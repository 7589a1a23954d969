//! Build script for rotachron-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates clock.toml at compile time

use std::collections::BTreeMap;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const AXES: [&str; 4] = ["hour_tens", "hour_units", "minute_tens", "minute_units"];
/// Microstep factor and the MS1/MS2/MS3 lines it drives high
const MICROSTEP_TABLE: [(i64, [bool; 3]); 5] = [
    (1, [false, false, false]),
    (2, [true, false, false]),
    (4, [false, true, false]),
    (8, [true, true, false]),
    (16, [true, true, true]),
];
/// GPIO0/1 carry the command link UART
const LINK_PINS: [i64; 2] = [0, 1];
/// GPIO26/27 carry the RTC on I2C1
const RTC_PINS: [i64; 2] = [26, 27];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    // Linker scripts for cortex-m-rt and defmt
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

/// Validate clock.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=clock.toml");

    let config_path = Path::new("clock.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: clock.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds clock.toml as its default configuration.    ║\n\
            ║  Please create one in the rotachron-firmware directory.          ║\n\
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
    validate_geometry(&config, &mut errors);
    validate_motion(&config, &mut errors);
    validate_time(&config, &mut errors);
    validate_pins(&config, &mut errors);
    validate_microstep_wiring(&config, &mut errors);

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

fn int(table: &toml::Value, key: &str) -> Option<i64> {
    table.get(key).and_then(toml::Value::as_integer)
}

fn validate_geometry(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(geometry) = config.get("geometry") else {
        return;
    };

    if int(geometry, "full_steps_per_rev").is_some_and(|v| v <= 0 || v > u16::MAX as i64) {
        errors.push("[geometry] full_steps_per_rev must be 1-65535".into());
    }
    if let Some(microsteps) = int(geometry, "microsteps") {
        if !MICROSTEP_TABLE.iter().any(|(factor, _)| *factor == microsteps) {
            errors.push("[geometry] microsteps must be 1, 2, 4, 8 or 16".into());
        }
    }
    if int(geometry, "centidegrees_per_digit").is_some_and(|v| v <= 0 || v > 3600) {
        errors.push("[geometry] centidegrees_per_digit must be 1-3600".into());
    }
}

fn validate_motion(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(motion) = config.get("motion") else {
        return;
    };

    for key in ["max_speed", "acceleration", "move_poll_us"] {
        if int(motion, key).is_some_and(|v| v <= 0) {
            errors.push(format!("[motion] {} must be positive", key));
        }
    }

    let move_poll = int(motion, "move_poll_us").unwrap_or(250);
    let idle_poll = int(motion, "idle_poll_us").unwrap_or(2500);
    if idle_poll < move_poll {
        errors.push("[motion] idle_poll_us must be >= move_poll_us".into());
    }
}

fn validate_time(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(time) = config.get("time") else {
        return;
    };

    if int(time, "utc_offset_minutes").is_some_and(|v| !(-720..=840).contains(&v)) {
        errors.push("[time] utc_offset_minutes must be -720 to 840".into());
    }
    if let Some(mode) = time.get("hour_mode") {
        let valid = match mode {
            toml::Value::Integer(h) => *h == 12 || *h == 24,
            toml::Value::String(h) => h == "12" || h == "24",
            _ => false,
        };
        if !valid {
            errors.push("[time] hour_mode must be 12 or 24".into());
        }
    }
    if int(time, "recovery_window_s").is_some_and(|v| v < 0 || v > u32::MAX as i64) {
        errors.push("[time] recovery_window_s out of range".into());
    }
}

/// Parse "gpioN", "!gpioN" or a bare number
fn pin_number(value: &toml::Value) -> Option<i64> {
    match value {
        toml::Value::Integer(n) => Some(*n),
        toml::Value::String(s) => {
            let s = s.strip_prefix('!').unwrap_or(s);
            s.strip_prefix("gpio").unwrap_or(s).parse().ok()
        }
        _ => None,
    }
}

/// Four distinct axes, every pin valid and claimed once
fn validate_pins(config: &toml::Value, errors: &mut Vec<String>) {
    let mut claimed: BTreeMap<i64, String> = LINK_PINS
        .iter()
        .map(|&pin| (pin, "command link".to_string()))
        .chain(RTC_PINS.iter().map(|&pin| (pin, "RTC bus".to_string())))
        .collect();

    let mut claim = |owner: String, value: &toml::Value, errors: &mut Vec<String>| {
        match pin_number(value) {
            Some(pin) if (0..=29).contains(&pin) => {
                if let Some(previous) = claimed.insert(pin, owner.clone()) {
                    errors.push(format!("gpio{} used by both {} and {}", pin, previous, owner));
                }
            }
            _ => errors.push(format!("{} is not a valid pin", owner)),
        }
    };

    let axes = config.get("axis").and_then(toml::Value::as_table);
    for name in AXES {
        let Some(axis) = axes.and_then(|t| t.get(name)) else {
            errors.push(format!("Missing [axis.{}] section", name));
            continue;
        };
        for key in ["step_pin", "dir_pin"] {
            match axis.get(key) {
                Some(value) => claim(format!("axis.{}.{}", name, key), value, errors),
                None => errors.push(format!("[axis.{}] missing '{}'", name, key)),
            }
        }
        if let Some(value) = axis.get("enable_pin") {
            claim(format!("axis.{}.enable_pin", name), value, errors);
        }
    }

    if let Some(table) = axes {
        for name in table.keys() {
            if !AXES.contains(&name.as_str()) {
                errors.push(format!("Unknown axis [axis.{}]", name));
            }
        }
    }

    if let Some(microstep) = config.get("microstep") {
        for key in ["ms1", "ms2", "ms3"] {
            if let Some(value) = microstep.get(key) {
                claim(format!("microstep.{}", key), value, errors);
            }
        }
    }
}

/// Unwired select lines are hard-wired low; the factor must not need them
fn validate_microstep_wiring(config: &toml::Value, errors: &mut Vec<String>) {
    let microsteps = config
        .get("geometry")
        .and_then(|g| int(g, "microsteps"))
        .unwrap_or(16);
    let Some((_, levels)) = MICROSTEP_TABLE.iter().find(|(factor, _)| *factor == microsteps) else {
        return;
    };

    let microstep = config.get("microstep");
    for (key, high) in ["ms1", "ms2", "ms3"].into_iter().zip(levels) {
        if *high && microstep.and_then(|t| t.get(key)).is_none() {
            errors.push(format!(
                "[geometry] microsteps = {} needs [microstep] {} wired",
                microsteps, key
            ));
        }
    }
}
