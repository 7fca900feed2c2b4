//! REPL – interactive servo shell.
//!
//! Supported slash-commands:
//!   /help                         – show this list
//!   /limits                       – print every joint's range
//!   /angles                       – print cached joint angles
//!   /set <joint> <deg>            – move one joint
//!   /arm <left|right> <sh> <el>   – move an arm (shoulder, elbow)
//!   /gripper <open|close>         – both grippers to a bound
//!   /gripper <left|right> <deg>   – one gripper
//!   /gripper both <l> <r>         – both grippers to given angles
//!   /neck <left|right|center|deg> – neck yaw
//!   /wave <left|right> [secs]     – play the wave script (default 2 s)
//!   /reset                        – every joint to 0°
//!   /quit | /exit                 – leave the shell

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bonic_servo::Arm;

use crate::session::Session;

/// One parsed REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Limits,
    Angles,
    Set { joint: String, angle: f64 },
    Arm { arm: Arm, shoulder: f64, elbow: f64 },
    GrippersOpen,
    GrippersClose,
    Grippers { left: f64, right: f64 },
    LeftGripper(f64),
    RightGripper(f64),
    Neck(NeckTarget),
    Wave { arm: Arm, duration: Duration },
    Reset,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeckTarget {
    Left,
    Right,
    Center,
    Yaw(f64),
}

const DEFAULT_WAVE: Duration = Duration::from_secs(2);

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(session: &Session, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "bonicbot>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok(Command::Quit) => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Ok(cmd) => {
                if let Err(e) = execute(session, &cmd) {
                    println!("{}: {}", "Error".red(), e);
                }
            }
            Err(e) => println!(
                "{} Type {} for available commands.",
                e.red(),
                "/help".bold()
            ),
        }
    }
}

/// Parse one REPL line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let cmd = match (head, args.as_slice()) {
        ("/help", []) => Command::Help,
        ("/limits", []) => Command::Limits,
        ("/angles", []) => Command::Angles,
        ("/set", [joint, angle]) => Command::Set {
            joint: joint.to_string(),
            angle: parse_deg(angle)?,
        },
        ("/arm", [arm, shoulder, elbow]) => Command::Arm {
            arm: parse_arm(arm)?,
            shoulder: parse_deg(shoulder)?,
            elbow: parse_deg(elbow)?,
        },
        ("/gripper", ["open"]) => Command::GrippersOpen,
        ("/gripper", ["close"]) => Command::GrippersClose,
        ("/gripper", ["left", angle]) => Command::LeftGripper(parse_deg(angle)?),
        ("/gripper", ["right", angle]) => Command::RightGripper(parse_deg(angle)?),
        ("/gripper", ["both", left, right]) => Command::Grippers {
            left: parse_deg(left)?,
            right: parse_deg(right)?,
        },
        ("/neck", ["left"]) => Command::Neck(NeckTarget::Left),
        ("/neck", ["right"]) => Command::Neck(NeckTarget::Right),
        ("/neck", ["center"]) => Command::Neck(NeckTarget::Center),
        ("/neck", [yaw]) => Command::Neck(NeckTarget::Yaw(parse_deg(yaw)?)),
        ("/wave", [arm]) => Command::Wave {
            arm: parse_arm(arm)?,
            duration: DEFAULT_WAVE,
        },
        ("/wave", [arm, secs]) => Command::Wave {
            arm: parse_arm(arm)?,
            duration: parse_secs(secs)?,
        },
        ("/reset", []) => Command::Reset,
        ("/quit" | "/exit", []) => Command::Quit,
        _ => return Err(format!("Unknown or malformed command: '{line}'.")),
    };
    Ok(cmd)
}

fn parse_deg(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| format!("'{raw}' is not an angle in degrees."))
}

fn parse_secs(raw: &str) -> Result<Duration, String> {
    raw.parse::<f64>()
        .ok()
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .ok_or_else(|| format!("'{raw}' is not a duration in seconds."))
}

fn parse_arm(raw: &str) -> Result<Arm, String> {
    match raw {
        "left" => Ok(Arm::Left),
        "right" => Ok(Arm::Right),
        other => Err(format!("'{other}' is not an arm (left / right).")),
    }
}

/// Run a parsed command against `session`.
pub fn execute(session: &Session, cmd: &Command) -> Result<(), String> {
    let servo = session.servo();
    let result = match cmd {
        Command::Help => {
            cmd_help();
            Ok(())
        }
        Command::Limits => {
            cmd_limits(session);
            Ok(())
        }
        Command::Angles => {
            cmd_angles(session);
            Ok(())
        }
        Command::Set { joint, angle } => servo.set_single(joint, *angle),
        Command::Arm {
            arm,
            shoulder,
            elbow,
        } => servo.move_arm(*arm, *shoulder, *elbow),
        Command::GrippersOpen => servo.open_grippers(),
        Command::GrippersClose => servo.close_grippers(),
        Command::Grippers { left, right } => servo.set_grippers(*left, *right),
        Command::LeftGripper(angle) => servo.set_left_gripper(*angle),
        Command::RightGripper(angle) => servo.set_right_gripper(*angle),
        Command::Neck(NeckTarget::Left) => servo.look_left(),
        Command::Neck(NeckTarget::Right) => servo.look_right(),
        Command::Neck(NeckTarget::Center) => servo.look_center(),
        Command::Neck(NeckTarget::Yaw(yaw)) => servo.set_neck(*yaw),
        Command::Wave { arm, duration } => {
            println!("  Waving for {:.1}s …", duration.as_secs_f64());
            servo.wave(*arm, *duration)
        }
        Command::Reset => servo.reset_all(),
        Command::Quit => Ok(()),
    };
    session.settle();
    result.map_err(|e| e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "BonicBot Servo Commands".bold().underline());
    println!("  {}                        – joint ranges", "/limits".bold().cyan());
    println!("  {}                        – cached joint angles", "/angles".bold().cyan());
    println!("  {}             – move one joint", "/set <joint> <deg>".bold().cyan());
    println!("  {}   – move an arm", "/arm <left|right> <sh> <el>".bold().cyan());
    println!("  {}         – both grippers to a bound", "/gripper <open|close>".bold().cyan());
    println!("  {}   – one gripper", "/gripper <left|right> <deg>".bold().cyan());
    println!("  {}         – both grippers", "/gripper both <l> <r>".bold().cyan());
    println!("  {} – neck yaw", "/neck <left|right|center|deg>".bold().cyan());
    println!("  {}     – wave an arm", "/wave <left|right> [secs]".bold().cyan());
    println!("  {}                         – all joints to 0°", "/reset".bold().cyan());
    println!("  {}                  – exit", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_limits(session: &Session) {
    println!("{}", "Servo limits".bold().underline());
    for spec in session.servo().table().specs() {
        println!(
            "  {:<30} [{:>6.1}°, {:>6.1}°]",
            spec.name, spec.min_deg, spec.max_deg
        );
    }
}

fn cmd_angles(session: &Session) {
    println!("{}", "Current servo angles".bold().underline());
    let angles = session.servo().angles();
    for name in session.servo().table().order() {
        if let Some(angle) = angles.get(name) {
            println!("  {:<30} {:>7.2}°", name, angle);
        }
    }
}
