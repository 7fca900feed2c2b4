//! Live servo position monitor.

use colored::Colorize;
use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bonic_servo::ServoGroup;

use crate::session::Session;

const RULE: &str = "======================================================================";

/// Redraw the servo view every `rate` until `shutdown` is set.
pub fn run(session: &Session, rate: Duration, shutdown: Arc<AtomicBool>) -> Result<(), String> {
    while !shutdown.load(Ordering::SeqCst) {
        let group = session.servo().group_angles().map_err(|e| e.to_string())?;
        let feedback = match session.servo().last_feedback() {
            Some(at) => format!("last feedback {}", at.format("%H:%M:%S%.3f")),
            None => "no feedback yet".to_string(),
        };
        // Clear screen and home the cursor.
        print!("\x1B[2J\x1B[H");
        println!("{}", RULE);
        println!("{}  ({})", "BONICBOT SERVO POSITION MONITOR".bold(), session.describe());
        println!("{}", RULE);
        print!("{}", render(&group));
        println!("{}", RULE);
        println!("  {}", feedback.dimmed());
        println!("  Press Ctrl+C to exit");
        std::thread::sleep(rate);
    }
    Ok(())
}

fn format_angle(angle: f64) -> String {
    format!("{angle:>7.2}°")
}

/// The grouped body-part view, one line per servo.
pub fn render(group: &ServoGroup) -> String {
    let mut out = String::new();
    let sections: [(&str, [(&str, f64); 2]); 3] = [
        (
            "LEFT ARM",
            [("Shoulder", group.left_shoulder), ("Elbow", group.left_elbow)],
        ),
        (
            "RIGHT ARM",
            [("Shoulder", group.right_shoulder), ("Elbow", group.right_elbow)],
        ),
        (
            "GRIPPERS",
            [("Left", group.left_gripper), ("Right", group.right_gripper)],
        ),
    ];
    for (title, rows) in sections {
        let _ = writeln!(out, "\n{title}:");
        for (label, angle) in rows {
            let _ = writeln!(out, "   {:<9} {:>10}", format!("{label}:"), format_angle(angle));
        }
    }
    let _ = writeln!(out, "\nNECK:");
    let _ = writeln!(out, "   {:<9} {:>10}", "Yaw:", format_angle(group.neck_yaw));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lists_every_servo() {
        let group = ServoGroup {
            left_shoulder: 90.0,
            right_elbow: 12.5,
            neck_yaw: -30.0,
            ..ServoGroup::default()
        };
        let text = render(&group);
        assert!(text.contains("LEFT ARM:"));
        assert!(text.contains("GRIPPERS:"));
        assert!(text.contains("  90.00°"));
        assert!(text.contains("  12.50°"));
        assert!(text.contains(" -30.00°"));
        assert_eq!(text.matches('°').count(), 7);
    }

    #[test]
    fn run_returns_immediately_when_already_shut_down() {
        let session = Session::simulated();
        let shutdown = Arc::new(AtomicBool::new(true));
        run(&session, Duration::from_millis(1), shutdown).unwrap();
    }
}
