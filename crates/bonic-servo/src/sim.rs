//! In-process simulation sink for tests and offline runs.
//!
//! [`SimSink`] records every command array it is handed and can be switched
//! into a failing mode to exercise the controller's publish-failure path.  It
//! can also play the part of the hardware by turning the most recent command
//! back into a `/joint_states` frame.
//!
//! # Example
//!
//! ```rust
//! use bonic_servo::{JointTable, ServoController, SimSink};
//! use bonic_servo::joints::NECK_YAW;
//!
//! let sink = SimSink::new();
//! let servo = ServoController::new(JointTable::bonicbot(), sink.boxed());
//!
//! servo.set_single(NECK_YAW, 30.0).expect("sim publish must succeed");
//! assert_eq!(sink.published().len(), 1);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bonic_types::{BonicError, Float64MultiArray, JointState};
use parking_lot::Mutex;

use crate::joints::JointTable;
use crate::sink::CommandSink;

#[derive(Default)]
struct SimSinkInner {
    published: Mutex<Vec<Float64MultiArray>>,
    failing: AtomicBool,
}

/// A simulated command sink.  Clones share the same history.
#[derive(Clone, Default)]
pub struct SimSink {
    inner: Arc<SimSinkInner>,
}

impl SimSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A boxed clone, ready to hand to [`ServoController::new`][crate::ServoController::new].
    pub fn boxed(&self) -> Box<dyn CommandSink> {
        Box::new(self.clone())
    }

    /// Make subsequent publishes fail (`true`) or succeed (`false`).
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Every command published so far, oldest first.
    pub fn published(&self) -> Vec<Float64MultiArray> {
        self.inner.published.lock().clone()
    }

    /// The most recent command, if any.
    pub fn last(&self) -> Option<Float64MultiArray> {
        self.inner.published.lock().last().cloned()
    }

    /// Report the most recent command back as a joint-state frame, as if the
    /// servos had reached their targets.
    pub fn echo_joint_state(&self, table: &JointTable) -> Option<JointState> {
        let last = self.last()?;
        Some(JointState {
            name: table.order().map(str::to_string).collect(),
            position: last.data,
        })
    }
}

impl CommandSink for SimSink {
    fn publish(&self, command: &Float64MultiArray) -> Result<(), BonicError> {
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(BonicError::Transport(
                "simulated transport failure".to_string(),
            ));
        }
        self.inner.published.lock().push(command.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_published_commands_across_clones() {
        let sink = SimSink::new();
        let boxed = sink.boxed();
        boxed
            .publish(&Float64MultiArray {
                data: vec![1.0, 2.0],
            })
            .unwrap();
        assert_eq!(sink.published().len(), 1);
        assert_eq!(sink.last().unwrap().data, vec![1.0, 2.0]);
    }

    #[test]
    fn failing_mode_rejects_and_records_nothing() {
        let sink = SimSink::new();
        sink.set_failing(true);
        let result = sink.publish(&Float64MultiArray::default());
        assert!(matches!(result, Err(BonicError::Transport(_))));
        assert!(sink.published().is_empty());

        sink.set_failing(false);
        assert!(sink.publish(&Float64MultiArray::default()).is_ok());
    }

    #[test]
    fn echo_joint_state_names_joints_in_table_order() {
        let table = JointTable::bonicbot();
        let sink = SimSink::new();
        assert!(sink.echo_joint_state(&table).is_none());

        sink.publish(&Float64MultiArray {
            data: vec![0.0; table.len()],
        })
        .unwrap();
        let state = sink.echo_joint_state(&table).unwrap();
        assert_eq!(state.name.len(), 7);
        assert_eq!(state.name[0], "left_shoulder_pitch_joint");
        assert_eq!(state.position.len(), 7);
    }
}
