//! Build script for stepgen-firmware
//!
//! - Sets up linker search paths and scripts
//! - Validates stepgen.toml at compile time
//! - Emits the validated values as constants in `$OUT_DIR/stepgen_config.rs`

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Bank-0 GPIOs that can carry the STEP output
const NUM_GPIOS: i64 = 30;

/// Ramp table capacity of the firmware's axis (`DEFAULT_MAX_STEPS`)
const MAX_RAMP_STEPS: i64 = 256;

const MIN_FREQUENCY_HZ: f64 = 0.1;

fn main() {
    setup_linker();
    let config = load_config();
    let axis = validate_axis(&config);
    let demo = validate_demo(&config);
    write_constants(&axis, &demo);
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

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and parse stepgen.toml
fn load_config() -> toml::Value {
    println!("cargo:rerun-if-changed=stepgen.toml");

    let config_path = Path::new("stepgen.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: stepgen.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a stepgen.toml configuration file.        ║\n\
            ║  Please create one in the stepgen-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read stepgen.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in stepgen.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    }
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

fn report(section: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: Invalid [{:<10}] configuration                         ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        section,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

struct Axis {
    step_pin: i64,
    duty: f64,
    start_hz: f64,
    target_hz: f64,
    end_hz: f64,
    ramp_steps: i64,
}

struct Demo {
    run_ms: i64,
    idle_ms: i64,
}

/// Integer or float field as f64
fn number(table: &toml::Table, key: &str) -> Option<f64> {
    match table.get(key)? {
        toml::Value::Float(f) => Some(*f),
        toml::Value::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

fn integer(table: &toml::Table, key: &str) -> Option<i64> {
    table.get(key)?.as_integer()
}

fn section<'a>(config: &'a toml::Value, name: &str) -> &'a toml::Table {
    match config.get(name).and_then(|v| v.as_table()) {
        Some(table) => table,
        None => {
            report(name, &[format!("missing [{}] section", name)]);
            unreachable!()
        }
    }
}

fn validate_axis(config: &toml::Value) -> Axis {
    let table = section(config, "axis");
    let mut errors = Vec::new();

    let step_pin = integer(table, "step_pin").unwrap_or_else(|| {
        errors.push("'step_pin' must be an integer".to_string());
        0
    });
    if !(0..NUM_GPIOS).contains(&step_pin) {
        errors.push(format!("step_pin {} is not a GPIO (0-{})", step_pin, NUM_GPIOS - 1));
    }

    let duty = number(table, "duty").unwrap_or_else(|| {
        errors.push("'duty' must be a number".to_string());
        0.5
    });
    if !(duty > 0.0 && duty < 1.0) {
        errors.push(format!("duty {} must lie strictly between 0 and 1", duty));
    }

    let mut freq = |key: &str| {
        let value = number(table, key).unwrap_or_else(|| {
            errors.push(format!("'{}' must be a number", key));
            MIN_FREQUENCY_HZ
        });
        if !value.is_finite() || value < MIN_FREQUENCY_HZ {
            errors.push(format!("{} {} is below {} Hz", key, value, MIN_FREQUENCY_HZ));
        }
        value
    };
    let start_hz = freq("start_hz");
    let target_hz = freq("target_hz");
    let end_hz = freq("end_hz");

    let ramp_steps = integer(table, "ramp_steps").unwrap_or_else(|| {
        errors.push("'ramp_steps' must be an integer".to_string());
        2
    });
    if !(2..=MAX_RAMP_STEPS).contains(&ramp_steps) {
        errors.push(format!("ramp_steps {} outside 2-{}", ramp_steps, MAX_RAMP_STEPS));
    }

    report("axis", &errors);

    Axis {
        step_pin,
        duty,
        start_hz,
        target_hz,
        end_hz,
        ramp_steps,
    }
}

fn validate_demo(config: &toml::Value) -> Demo {
    let table = section(config, "demo");
    let mut errors = Vec::new();

    let mut millis = |key: &str| match integer(table, key) {
        Some(ms) if ms > 0 => ms,
        _ => {
            errors.push(format!("'{}' must be a positive integer", key));
            1
        }
    };
    let run_ms = millis("run_ms");
    let idle_ms = millis("idle_ms");

    report("demo", &errors);

    Demo { run_ms, idle_ms }
}

fn write_constants(axis: &Axis, demo: &Demo) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("stepgen_config.rs")).unwrap();

    writeln!(f, "// Generated from stepgen.toml by build.rs").unwrap();
    writeln!(f, "pub const STEP_PIN: u8 = {};", axis.step_pin).unwrap();
    writeln!(f, "pub const DUTY: f32 = {:?};", axis.duty).unwrap();
    writeln!(f, "pub const START_HZ: f32 = {:?};", axis.start_hz).unwrap();
    writeln!(f, "pub const TARGET_HZ: f32 = {:?};", axis.target_hz).unwrap();
    writeln!(f, "pub const END_HZ: f32 = {:?};", axis.end_hz).unwrap();
    writeln!(f, "pub const RAMP_STEPS: u16 = {};", axis.ramp_steps).unwrap();
    writeln!(f, "pub const RUN_MS: u64 = {};", demo.run_ms).unwrap();
    writeln!(f, "pub const IDLE_MS: u64 = {};", demo.idle_ms).unwrap();
    writeln!(f).unwrap();
    writeln!(f, "/// Take the configured STEP pin out of `embassy_rp::Peripherals`").unwrap();
    writeln!(f, "macro_rules! take_step_pin {{").unwrap();
    writeln!(f, "    ($p:expr) => {{").unwrap();
    writeln!(f, "        $p.PIN_{}", axis.step_pin).unwrap();
    writeln!(f, "    }};").unwrap();
    writeln!(f, "}}").unwrap();

    println!("cargo:warning=stepgen.toml validated successfully");
}
