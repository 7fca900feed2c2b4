//! `bonicbot` – BonicBot servo console
//!
//! This binary drives the BonicBot's seven servos through `rosbridge`.  It:
//!
//! 1. Loads `~/.bonicbot/config.toml`, writing the defaults on first run.
//! 2. Connects to the robot's rosbridge endpoint, or to the in-process
//!    simulator with `--sim`.
//! 3. Runs one of the interactive REPL (default), the live position monitor
//!    or the scripted servo check.
//! 4. Intercepts **Ctrl-C** to leave the active mode and close the link.

mod config;
mod demo;
mod monitor;
mod repl;
mod session;
mod telemetry;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use session::Session;

#[derive(Parser, Debug)]
#[command(name = "bonicbot", version, about = "Control BonicBot servos over rosbridge")]
struct Args {
    /// Robot hostname or IP; overrides the config file.
    #[arg(long)]
    host: Option<String>,

    /// rosbridge WebSocket port; overrides the config file.
    #[arg(long)]
    port: Option<u16>,

    /// Run against the in-process simulator instead of a robot.
    #[arg(long)]
    sim: bool,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Mode {
    /// Interactive command prompt (default).
    Repl,
    /// Continuously display servo positions.
    Monitor {
        /// Refresh interval in seconds; overrides the config file.
        #[arg(long, value_parser = parse_rate)]
        rate: Option<f64>,
    },
    /// Run the scripted servo check.
    Demo {
        /// Multiplier applied to every hold time; `0` skips the pauses.
        #[arg(long, default_value_t = 1.0, value_parser = parse_pace)]
        pace: f64,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _tracing = telemetry::init_tracing("bonicbot");

    print_banner();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    let mut cfg = load_config();
    if let Some(host) = args.host {
        cfg.host = host;
    }
    if let Some(port) = args.port {
        cfg.port = port;
    }

    let session = if args.sim {
        println!("  Running against the {}.", "simulator".bold());
        Session::simulated()
    } else {
        print!("\n  Connecting to {} … ", cfg.rosbridge_url().dimmed());
        std::io::stdout().flush().ok();
        match Session::connect(&cfg) {
            Ok(session) => {
                println!("{}", "connected".green());
                session
            }
            Err(e) => {
                println!("{}", "failed".red());
                println!("  {}", e);
                println!(
                    "  {}  Start `{}` on the robot, or pass `{}`.",
                    "Is rosbridge running?".dimmed(),
                    "ros2 launch rosbridge_server rosbridge_websocket_launch.xml".bold(),
                    "--sim".bold()
                );
                return ExitCode::FAILURE;
            }
        }
    };
    info!(backend = %session.describe(), live = session.is_live(), "session started");

    let result = match args.mode.unwrap_or(Mode::Repl) {
        Mode::Repl => {
            println!();
            println!("  Type {} for a list of commands.\n", "/help".bold().cyan());
            repl::run(&session, shutdown);
            Ok(())
        }
        Mode::Monitor { rate } => monitor_interval(rate, &cfg)
            .and_then(|interval| monitor::run(&session, interval, shutdown)),
        Mode::Demo { pace } => demo::run(&session, pace).map_err(|e| e.to_string()),
    };

    session.close();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}: {}", "Error".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn parse_rate(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if config::is_valid_rate(secs) {
        Ok(secs)
    } else {
        Err("rate must be a finite number of seconds greater than 0".to_string())
    }
}

fn parse_pace(raw: &str) -> Result<f64, String> {
    let pace: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if pace.is_finite() && pace >= 0.0 {
        Ok(pace)
    } else {
        Err("pace must be a finite number of at least 0".to_string())
    }
}

/// The monitor refresh interval: the `--rate` flag, else the config value.
fn monitor_interval(rate: Option<f64>, cfg: &config::Config) -> Result<Duration, String> {
    let secs = rate.unwrap_or(cfg.monitor_rate_secs);
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid monitor rate {secs}: {e}"))
}

/// Load the config file, saving the defaults when none exists yet.
fn load_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   ___            _     ___      _   "#.bold().cyan());
    println!("{}", r#"  | _ ) ___ _ _  (_)__ | _ ) ___| |_ "#.bold().cyan());
    println!("{}", r#"  | _ \/ _ \ ' \ | / _|| _ \/ _ \  _|"#.bold().cyan());
    println!("{}", r#"  |___/\___/_||_||_\__||___/\___/\__|"#.bold().cyan());
    println!();
    println!(
        "  {} v{}",
        "BonicBot servo console".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default_to_repl() {
        let args = Args::try_parse_from(["bonicbot", "--sim"]).unwrap();
        assert!(args.sim);
        assert!(args.mode.is_none());
    }

    #[test]
    fn args_parse_monitor_rate_and_overrides() {
        let args =
            Args::try_parse_from(["bonicbot", "--host", "robot.local", "--port", "9091", "monitor", "--rate", "0.2"])
                .unwrap();
        assert_eq!(args.host.as_deref(), Some("robot.local"));
        assert_eq!(args.port, Some(9091));
        assert_eq!(args.mode, Some(Mode::Monitor { rate: Some(0.2) }));
    }

    #[test]
    fn args_parse_demo_pace() {
        let args = Args::try_parse_from(["bonicbot", "demo", "--pace", "0"]).unwrap();
        assert_eq!(args.mode, Some(Mode::Demo { pace: 0.0 }));
    }

    #[test]
    fn args_reject_unusable_rate_and_pace() {
        for rate in ["inf", "NaN", "0", "-1", "fast"] {
            assert!(
                Args::try_parse_from(["bonicbot", "monitor", "--rate", rate]).is_err(),
                "--rate {rate}"
            );
        }
        for pace in ["inf", "NaN", "-0.5"] {
            assert!(
                Args::try_parse_from(["bonicbot", "demo", "--pace", pace]).is_err(),
                "--pace {pace}"
            );
        }
    }

    #[test]
    fn monitor_interval_prefers_flag_over_config() {
        let cfg = config::Config::default();
        assert_eq!(monitor_interval(None, &cfg).unwrap(), Duration::from_millis(500));
        assert_eq!(monitor_interval(Some(0.25), &cfg).unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn monitor_interval_rejects_a_negative_config_rate() {
        let cfg = config::Config {
            monitor_rate_secs: -1.0,
            ..config::Config::default()
        };
        assert!(monitor_interval(None, &cfg).is_err());
    }
}
