//! Microcontroller simulator CLI.
//!
//! This binary runs a program against the simulated board. It performs:
//! 1. **Script run:** Execute a script file, then drive its periodic callbacks for a number of ticks.
//! 2. **Demo run:** Same, for one of the bundled demo programs.
//! 3. **Report:** Print the final board (or its JSON snapshot) and optional statistics.

use std::path::PathBuf;
use std::{fs, process};

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mcusim_core::common::constants::SERIAL_WINDOW;
use mcusim_core::config::Config;
use mcusim_core::soc::McuState;
use mcusim_core::soc::devices::{Direction, PinMode};
use mcusim_core::{SimStatus, Simulator};

/// Bundled demo programs: `(name, description, source)`.
const DEMOS: &[(&str, &str, &str)] = &[
    (
        "led_blink",
        "Toggle an LED on PA0 every 500 ms",
        include_str!("../../../demos/led_blink.js"),
    ),
    (
        "temperature_monitor",
        "Show the sensor reading on the LCD, alarm on PA0",
        include_str!("../../../demos/temperature_monitor.js"),
    ),
    (
        "motor_control",
        "Ramp the motor up and down, reversing at standstill",
        include_str!("../../../demos/motor_control.js"),
    ),
    (
        "lcd_display",
        "Scroll a banner and count elapsed time on the LCD",
        include_str!("../../../demos/lcd_display.js"),
    ),
    (
        "serial_telemetry",
        "Send a JSON telemetry packet over serial every second",
        include_str!("../../../demos/serial_telemetry.js"),
    ),
];

#[derive(Parser, Debug)]
#[command(
    name = "mcusim",
    author,
    version,
    about = "Scriptable microcontroller peripheral simulator",
    long_about = "Run a board program against simulated GPIO, registers, LCD, serial, sensor and motor.\n\nExamples:\n  mcusim run blink.js --ticks 20 --tick-ms 100\n  mcusim demo temperature_monitor --drift 0.5 --ticks 30\n  mcusim demos"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a script file.
    Run {
        /// Script to execute.
        path: PathBuf,

        #[command(flatten)]
        options: RunArgs,
    },

    /// Run one of the bundled demo programs.
    Demo {
        /// Demo name (see `mcusim demos`).
        name: String,

        #[command(flatten)]
        options: RunArgs,
    },

    /// List the bundled demo programs.
    Demos,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of loop ticks to run after the program's top level completes.
    #[arg(short, long, default_value_t = 10)]
    ticks: u32,

    /// Virtual milliseconds per tick.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Temperature drift applied before every tick, in °C.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    drift: f64,

    /// Drive an input pin before the program runs (repeatable), e.g. `--gpio 3=1`.
    #[arg(long = "gpio", value_name = "PIN=VALUE", value_parser = parse_gpio)]
    gpio: Vec<(usize, bool)>,

    /// Print the final state as a JSON snapshot instead of the board view.
    #[arg(long)]
    json: bool,

    /// Print simulation statistics.
    #[arg(long)]
    stats: bool,

    /// Enable debug logging (overrides RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { path, options } => {
            let source = fs::read_to_string(&path).unwrap_or_else(|e| {
                eprintln!("Error reading script {}: {}", path.display(), e);
                process::exit(1);
            });
            cmd_run(&source, &options);
        }
        Commands::Demo { name, options } => {
            let Some((_, _, source)) = DEMOS.iter().find(|(n, _, _)| *n == name) else {
                eprintln!("Error: unknown demo '{name}'");
                eprintln!("  mcusim demos   lists the available demos");
                process::exit(1);
            };
            cmd_run(source, &options);
        }
        Commands::Demos => {
            for (name, description, _) in DEMOS {
                println!("  {name:<22}{description}");
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_gpio(arg: &str) -> Result<(usize, bool), String> {
    let (pin, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected PIN=VALUE, got '{arg}'"))?;
    let pin = pin
        .trim()
        .parse()
        .map_err(|e| format!("invalid pin '{pin}': {e}"))?;
    let value = match value.trim() {
        "1" | "true" | "high" => true,
        "0" | "false" | "low" => false,
        other => return Err(format!("invalid level '{other}' (use 1/0, true/false, high/low)")),
    };
    Ok((pin, value))
}

/// Runs `source`, then starts the board and drives `ticks` loop iterations.
///
/// Exits with code 1 if the program fails or a periodic callback raises.
fn cmd_run(source: &str, options: &RunArgs) {
    init_tracing(options.verbose);

    let config = match &options.config {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            process::exit(1);
        }),
        None => Config::default(),
    };

    let mut sim = Simulator::new(config);
    for &(pin, value) in &options.gpio {
        sim.simulate_gpio_input(pin, value);
    }

    let result = sim.execute_code(source);
    let mut failed = !result.success;
    if let Some(error) = &result.error {
        eprintln!("[!] {error}");
    } else {
        sim.start();
        for tick in 0..options.ticks {
            if options.drift.abs() > f64::EPSILON {
                sim.simulate_temperature_change(options.drift);
            }
            if let Err(e) = sim.tick(options.tick_ms) {
                eprintln!("[!] tick {tick}: {e}");
                failed = true;
                break;
            }
        }
        sim.stop();
        info!(
            callbacks = sim.stats().loop_callbacks,
            steps = sim.stats().script_steps,
            "loop finished"
        );
    }

    if options.json {
        match sim.state().to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error: {e}"),
        }
    } else {
        print!("{}", render_board(sim.state(), sim.status()));
    }
    if options.stats {
        sim.stats().print();
    }

    if failed {
        process::exit(1);
    }
}

/// Text view of the board: pins, non-zero registers, LCD, motor, sensor and recent serial traffic.
fn render_board(state: &McuState, status: SimStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "[*] Board ({status}, {} MHz)\n",
        state.frequency / 1_000_000
    ));

    let outputs: Vec<String> = state
        .gpio
        .iter()
        .filter(|pin| pin.mode == PinMode::Output || pin.state)
        .map(|pin| format!("{}={}/{}", pin.name, pin.mode, u8::from(pin.state)))
        .collect();
    out.push_str(&format!(
        "    gpio     {}\n",
        if outputs.is_empty() {
            "-".to_string()
        } else {
            outputs.join(" ")
        }
    ));

    let registers: Vec<String> = state
        .registers
        .iter()
        .filter(|reg| reg.value != 0)
        .map(|reg| format!("{}=0x{:02X}", reg.name, reg.value))
        .collect();
    out.push_str(&format!(
        "    regs     {}\n",
        if registers.is_empty() {
            "-".to_string()
        } else {
            registers.join(" ")
        }
    ));

    out.push_str(&format!(
        "    motor    {} @ {}\n",
        state.motor.direction, state.motor.speed
    ));
    out.push_str(&format!(
        "    temp     {:.1} C\n",
        state.temperature.read()
    ));

    let lines = state.lcd.lines();
    let width = lines.first().map_or(0, |line| line.chars().count());
    out.push_str(&format!("    lcd      +{}+\n", "-".repeat(width)));
    for line in &lines {
        out.push_str(&format!("             |{line}|\n"));
    }
    out.push_str(&format!("             +{}+\n", "-".repeat(width)));

    let recent = state.serial.recent(SERIAL_WINDOW);
    out.push_str(&format!("    serial   {} entries\n", state.serial.len()));
    for entry in recent {
        let arrow = match entry.direction {
            Direction::Tx => "->",
            Direction::Rx => "<-",
        };
        out.push_str(&format!("      {arrow} {}\n", entry.data));
    }
    out
}
