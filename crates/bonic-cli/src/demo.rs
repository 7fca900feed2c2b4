//! Scripted servo check: exercises every joint group once and returns to
//! neutral.

use colored::Colorize;
use std::time::Duration;

use bonic_types::BonicError;

use crate::session::Session;

/// One demo step: a label, the motion, and how long to hold it.
type Step = (&'static str, fn(&Session) -> Result<(), BonicError>, f64);

const STEPS: &[Step] = &[
    ("Reset all servos to neutral", |s: &Session| s.servo().reset_all(), 1.0),
    ("Left arm: shoulder 90°, elbow 30°", |s: &Session| s.servo().move_left_arm(90.0, 30.0), 1.5),
    ("Left arm: shoulder 45°, elbow 10°", |s: &Session| s.servo().move_left_arm(45.0, 10.0), 1.5),
    ("Left arm: neutral", |s: &Session| s.servo().move_left_arm(0.0, 0.0), 1.0),
    ("Right arm: shoulder 90°, elbow 30°", |s: &Session| s.servo().move_right_arm(90.0, 30.0), 1.5),
    ("Right arm: shoulder 45°, elbow 10°", |s: &Session| s.servo().move_right_arm(45.0, 10.0), 1.5),
    ("Right arm: neutral", |s: &Session| s.servo().move_right_arm(0.0, 0.0), 1.0),
    ("Open both grippers", |s: &Session| s.servo().open_grippers(), 1.5),
    ("Close both grippers", |s: &Session| s.servo().close_grippers(), 1.5),
    ("Grippers: neutral", |s: &Session| s.servo().set_grippers(0.0, 0.0), 1.0),
    ("Left gripper to 45°", |s: &Session| s.servo().set_left_gripper(45.0), 1.5),
    ("Right gripper to 45°", |s: &Session| s.servo().set_right_gripper(45.0), 1.5),
    ("Left gripper to 0°", |s: &Session| s.servo().set_left_gripper(0.0), 1.5),
    ("Right gripper to 0°", |s: &Session| s.servo().set_right_gripper(0.0), 1.0),
    ("Look left", |s: &Session| s.servo().look_left(), 1.5),
    ("Look right", |s: &Session| s.servo().look_right(), 1.5),
    ("Look center", |s: &Session| s.servo().look_center(), 1.0),
    ("Final reset to neutral", |s: &Session| s.servo().reset_all(), 1.0),
];

/// Run every step, holding each for its duration scaled by `pace`
/// (`0.0` runs without pauses).  Holds that do not form a valid duration
/// are skipped.
pub fn run(session: &Session, pace: f64) -> Result<(), BonicError> {
    println!("{}", "BonicBot servo check".bold().underline());
    for (i, (label, motion, hold)) in STEPS.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, label);
        motion(session)?;
        session.settle();
        if let Ok(pause) = Duration::try_from_secs_f64(hold * pace) {
            std::thread::sleep(pause);
        }
    }

    println!("\n  Current servo angles:");
    let angles = session.servo().angles();
    for name in session.servo().table().order() {
        if let Some(angle) = angles.get(name) {
            println!("    {:<30} {:>7.2}°", name, angle);
        }
    }
    println!("\n  {} Servo check completed.", "✓".green().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_ends_at_neutral() {
        let session = Session::simulated();
        run(&session, 0.0).unwrap();
        assert!(session.servo().angles().values().all(|a| a.abs() < 1e-9));
    }

    #[test]
    fn demo_skips_pauses_it_cannot_represent() {
        let session = Session::simulated();
        run(&session, f64::INFINITY).unwrap();
        run(&session, -1.0).unwrap();
        assert!(session.servo().angles().values().all(|a| a.abs() < 1e-9));
    }
}
