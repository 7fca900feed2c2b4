//! Named motions built on [`ServoController::set_angles`].
//!
//! None of these hold state of their own.  Each one is a single
//! `set_angles` call, apart from the wave script, which plays a fixed list
//! of arm poses back one after another and blocks the calling thread until
//! the last pose has been held.

use std::time::Duration;

use bonic_types::BonicError;

use crate::controller::ServoController;
use crate::joints::{
    LEFT_ELBOW, LEFT_GRIPPER, LEFT_SHOULDER, NECK_YAW, RIGHT_ELBOW, RIGHT_GRIPPER, RIGHT_SHOULDER,
};

/// Fully open gripper angle in degrees.
pub const GRIPPER_OPEN_DEG: f64 = 60.0;
/// Fully closed gripper angle in degrees.
pub const GRIPPER_CLOSED_DEG: f64 = -45.0;

/// Neck yaw for "look left" (degrees; positive turns left).
pub const NECK_LEFT_DEG: f64 = 90.0;
pub const NECK_RIGHT_DEG: f64 = -90.0;
pub const NECK_CENTER_DEG: f64 = 0.0;

/// Wave poses as `(shoulder, elbow)` in degrees.  Each is held for a quarter
/// of the requested duration.
pub const WAVE_STEPS: [(f64, f64); 4] = [(90.0, 30.0), (45.0, 10.0), (90.0, 30.0), (0.0, 0.0)];

/// Blocks the calling thread between steps of a scripted motion.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Which arm a two-joint arm command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arm {
    Left,
    Right,
}

impl Arm {
    fn joints(self) -> (&'static str, &'static str) {
        match self {
            Arm::Left => (LEFT_SHOULDER, LEFT_ELBOW),
            Arm::Right => (RIGHT_SHOULDER, RIGHT_ELBOW),
        }
    }
}

/// Grouped view of the BonicBot servos in degrees, as shown by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ServoGroup {
    pub left_shoulder: f64,
    pub left_elbow: f64,
    pub right_shoulder: f64,
    pub right_elbow: f64,
    pub left_gripper: f64,
    pub right_gripper: f64,
    pub neck_yaw: f64,
}

impl ServoController {
    pub fn move_arm(&self, arm: Arm, shoulder_deg: f64, elbow_deg: f64) -> Result<(), BonicError> {
        let (shoulder, elbow) = arm.joints();
        self.set_angles([(shoulder, shoulder_deg), (elbow, elbow_deg)])
    }

    pub fn move_left_arm(&self, shoulder_deg: f64, elbow_deg: f64) -> Result<(), BonicError> {
        self.move_arm(Arm::Left, shoulder_deg, elbow_deg)
    }

    pub fn move_right_arm(&self, shoulder_deg: f64, elbow_deg: f64) -> Result<(), BonicError> {
        self.move_arm(Arm::Right, shoulder_deg, elbow_deg)
    }

    /// Set both gripper fingers in one command.
    pub fn set_grippers(&self, left_deg: f64, right_deg: f64) -> Result<(), BonicError> {
        self.set_angles([(LEFT_GRIPPER, left_deg), (RIGHT_GRIPPER, right_deg)])
    }

    pub fn set_left_gripper(&self, angle_deg: f64) -> Result<(), BonicError> {
        self.set_single(LEFT_GRIPPER, angle_deg)
    }

    pub fn set_right_gripper(&self, angle_deg: f64) -> Result<(), BonicError> {
        self.set_single(RIGHT_GRIPPER, angle_deg)
    }

    pub fn open_grippers(&self) -> Result<(), BonicError> {
        self.set_grippers(GRIPPER_OPEN_DEG, GRIPPER_OPEN_DEG)
    }

    pub fn close_grippers(&self) -> Result<(), BonicError> {
        self.set_grippers(GRIPPER_CLOSED_DEG, GRIPPER_CLOSED_DEG)
    }

    pub fn set_neck(&self, yaw_deg: f64) -> Result<(), BonicError> {
        self.set_single(NECK_YAW, yaw_deg)
    }

    pub fn look_left(&self) -> Result<(), BonicError> {
        self.set_neck(NECK_LEFT_DEG)
    }

    pub fn look_right(&self) -> Result<(), BonicError> {
        self.set_neck(NECK_RIGHT_DEG)
    }

    pub fn look_center(&self) -> Result<(), BonicError> {
        self.set_neck(NECK_CENTER_DEG)
    }

    /// Drive every joint in the table to 0° in one command.
    pub fn reset_all(&self) -> Result<(), BonicError> {
        let neutral: Vec<(String, f64)> = self
            .table()
            .order()
            .map(|name| (name.to_string(), 0.0))
            .collect();
        self.set_angles(neutral)
    }

    /// Play the wave script on `arm`, blocking for `duration` in total.
    ///
    /// There is no cancellation: once started the script runs to completion
    /// on the calling thread unless a step fails to publish, in which case
    /// the error is returned and the remaining steps are skipped.  Running two
    /// waves concurrently interleaves their publishes.
    pub fn wave(&self, arm: Arm, duration: Duration) -> Result<(), BonicError> {
        let hold = duration / WAVE_STEPS.len() as u32;
        for (shoulder, elbow) in WAVE_STEPS {
            self.move_arm(arm, shoulder, elbow)?;
            self.sleeper.sleep(hold);
        }
        Ok(())
    }

    pub fn wave_left_arm(&self, duration: Duration) -> Result<(), BonicError> {
        self.wave(Arm::Left, duration)
    }

    pub fn wave_right_arm(&self, duration: Duration) -> Result<(), BonicError> {
        self.wave(Arm::Right, duration)
    }

    /// Cached angles grouped by body part.
    ///
    /// # Errors
    ///
    /// Returns [`BonicError::UnknownJoint`] when the controller was built from
    /// a table that lacks one of the BonicBot joints.
    pub fn group_angles(&self) -> Result<ServoGroup, BonicError> {
        let angles = self.angles();
        let get = |joint: &str| {
            angles
                .get(joint)
                .copied()
                .ok_or_else(|| BonicError::UnknownJoint(joint.to_string()))
        };
        Ok(ServoGroup {
            left_shoulder: get(LEFT_SHOULDER)?,
            left_elbow: get(LEFT_ELBOW)?,
            right_shoulder: get(RIGHT_SHOULDER)?,
            right_elbow: get(RIGHT_ELBOW)?,
            left_gripper: get(LEFT_GRIPPER)?,
            right_gripper: get(RIGHT_GRIPPER)?,
            neck_yaw: get(NECK_YAW)?,
        })
    }
}
