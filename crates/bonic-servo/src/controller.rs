//! [`ServoController`] – validates, clamps and publishes servo commands and
//! caches joint state from feedback.
//!
//! # Command pipeline
//!
//! A call to [`ServoController::set_angles`] takes a partial set of target
//! angles in degrees and:
//!
//! 1. merges them into a working copy of the cached angles,
//! 2. rejects the whole batch if any joint is unknown,
//! 3. clamps out-of-range angles to the nearest bound (with a warning),
//! 4. publishes one radian array laid out in [`JointTable`] order,
//! 5. adopts the working copy as the new cache only if the publish succeeded.
//!
//! # Feedback
//!
//! [`ServoController::on_feedback`] overwrites cached angles from
//! `/joint_states` frames.  It never fails; unusable entries are skipped.
//!
//! One mutex guards the cache.  It is held across the whole read-modify-write
//! of `set_angles` (publish included) and of `on_feedback`, so concurrent
//! callers are serialised and readers always see a consistent snapshot.

use std::collections::BTreeMap;

use bonic_types::{BonicError, Float64MultiArray, JointState};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use crate::joints::JointTable;
use crate::presets::{Sleeper, ThreadSleeper};
use crate::sink::{CommandSink, FeedbackHandler};

/// Cached joint state.  `angles_deg` is indexed by command-array position.
#[derive(Debug, Clone)]
struct ServoState {
    angles_deg: Vec<f64>,
    last_feedback: Option<DateTime<Utc>>,
}

/// The servo command manager.
///
/// Construct with [`ServoController::new`], then drive joints with
/// [`set_angles`][Self::set_angles] and feed `/joint_states` frames into
/// [`on_feedback`][Self::on_feedback] (or through the [`FeedbackHandler`]
/// impl).
pub struct ServoController {
    table: JointTable,
    sink: Box<dyn CommandSink>,
    state: Mutex<ServoState>,
    pub(crate) sleeper: Box<dyn Sleeper>,
}

impl ServoController {
    /// Create a controller for `table` that publishes through `sink`.
    ///
    /// Every joint starts at 0°.
    pub fn new(table: JointTable, sink: Box<dyn CommandSink>) -> Self {
        let state = ServoState {
            angles_deg: vec![0.0; table.len()],
            last_feedback: None,
        };
        Self {
            table,
            sink,
            state: Mutex::new(state),
            sleeper: Box::new(ThreadSleeper),
        }
    }

    /// Replace the sleeper used between steps of scripted motions.
    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn table(&self) -> &JointTable {
        &self.table
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Set any subset of joints to target angles in degrees and publish one
    /// full command array.
    ///
    /// Angles outside a joint's range are clamped to the nearest bound and a
    /// warning is logged.  Joints not mentioned keep their cached angle.
    ///
    /// # Errors
    ///
    /// * [`BonicError::UnknownJoint`] – a requested joint is not in the table.
    /// * [`BonicError::InvalidAngle`] – a requested angle is NaN.
    /// * [`BonicError::Publish`] – the sink rejected the command.
    ///
    /// On any error nothing is published (or the publish failed) and the
    /// cached angles are left untouched.
    #[instrument(level = "info", skip_all)]
    pub fn set_angles<I, K>(&self, requested: I) -> Result<(), BonicError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut state = self.lock_state();
        let mut working = state.angles_deg.clone();

        for (joint, angle) in requested {
            let joint = joint.as_ref();
            let idx = self
                .table
                .position(joint)
                .ok_or_else(|| BonicError::UnknownJoint(joint.to_string()))?;
            let spec = &self.table.specs()[idx];

            if angle.is_nan() {
                return Err(BonicError::InvalidAngle {
                    joint: joint.to_string(),
                });
            }

            working[idx] = if spec.contains(angle) {
                angle
            } else {
                let clamped = spec.clamp(angle);
                warn!(
                    joint,
                    requested_deg = angle,
                    min_deg = spec.min_deg,
                    max_deg = spec.max_deg,
                    clamped_deg = clamped,
                    "servo angle outside limits, clamping"
                );
                clamped
            };
        }

        let command = Float64MultiArray {
            data: working.iter().map(|deg| deg.to_radians()).collect(),
        };

        self.sink.publish(&command).map_err(|e| match e {
            BonicError::Publish(_) => e,
            other => BonicError::Publish(other.to_string()),
        })?;

        debug!(command = ?command.data, "servo command published");
        state.angles_deg = working;
        Ok(())
    }

    /// Set a single joint.  Shorthand for `set_angles([(joint, angle)])`.
    pub fn set_single(&self, joint: &str, angle_deg: f64) -> Result<(), BonicError> {
        self.set_angles([(joint, angle_deg)])
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot of every joint's cached angle in degrees.
    pub fn angles(&self) -> BTreeMap<String, f64> {
        let state = self.lock_state();
        self.table
            .order()
            .zip(state.angles_deg.iter())
            .map(|(name, &deg)| (name.to_string(), deg))
            .collect()
    }

    /// One joint's cached angle in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`BonicError::UnknownJoint`] when `joint` is not in the table.
    pub fn angle(&self, joint: &str) -> Result<f64, BonicError> {
        let idx = self
            .table
            .position(joint)
            .ok_or_else(|| BonicError::UnknownJoint(joint.to_string()))?;
        Ok(self.lock_state().angles_deg[idx])
    }

    /// `(min, max)` range of one joint in degrees.
    pub fn limits(&self, joint: &str) -> Result<(f64, f64), BonicError> {
        self.table.spec(joint).map(|spec| spec.range())
    }

    /// Ranges of every joint in degrees.
    pub fn all_limits(&self) -> BTreeMap<String, (f64, f64)> {
        self.table.limits()
    }

    /// When the last feedback frame was ingested, if ever.
    pub fn last_feedback(&self) -> Option<DateTime<Utc>> {
        self.lock_state().last_feedback
    }

    // -----------------------------------------------------------------------
    // Feedback
    // -----------------------------------------------------------------------

    /// Ingest a joint-state report: `names[i]` is at `positions_rad[i]`.
    ///
    /// Only indices present in both sequences are considered.  Unknown joint
    /// names are ignored; non-finite positions are logged and skipped.
    /// Returns the number of joints updated.
    #[instrument(level = "debug", skip_all, fields(joints = names.len()))]
    pub fn on_feedback<S: AsRef<str>>(&self, names: &[S], positions_rad: &[f64]) -> usize {
        if names.len() != positions_rad.len() {
            debug!(
                names = names.len(),
                positions = positions_rad.len(),
                "joint state name/position length mismatch"
            );
        }

        let mut state = self.lock_state();
        let mut updated = 0;
        for (name, &rad) in names.iter().zip(positions_rad) {
            let name = name.as_ref();
            let Some(idx) = self.table.position(name) else {
                continue;
            };
            if !rad.is_finite() {
                warn!(joint = name, position = rad, "dropping non-finite joint position");
                continue;
            }
            state.angles_deg[idx] = rad.to_degrees();
            updated += 1;
        }
        state.last_feedback = Some(Utc::now());
        updated
    }

    fn lock_state(&self) -> MutexGuard<'_, ServoState> {
        self.state.lock()
    }
}

impl FeedbackHandler for ServoController {
    fn on_joint_state(&self, state: &JointState) {
        self.on_feedback(state.name.as_slice(), state.position.as_slice());
    }
}
