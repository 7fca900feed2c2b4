use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static description of one controllable servo joint.
///
/// The range is inclusive and expressed in degrees.  Specs are fixed at
/// construction time and never change while a controller is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSpec {
    /// Joint identifier as it appears on the ROS graph, e.g. `"neck_yaw_joint"`.
    pub name: String,
    pub min_deg: f64,
    pub max_deg: f64,
}

impl JointSpec {
    pub fn new(name: impl Into<String>, min_deg: f64, max_deg: f64) -> Self {
        Self {
            name: name.into(),
            min_deg,
            max_deg,
        }
    }

    /// `true` when `angle_deg` lies inside `[min_deg, max_deg]`.
    pub fn contains(&self, angle_deg: f64) -> bool {
        angle_deg >= self.min_deg && angle_deg <= self.max_deg
    }

    /// Replace an out-of-range angle with the nearest bound.
    pub fn clamp(&self, angle_deg: f64) -> f64 {
        angle_deg.clamp(self.min_deg, self.max_deg)
    }

    /// The `(min, max)` pair in degrees.
    pub fn range(&self) -> (f64, f64) {
        (self.min_deg, self.max_deg)
    }
}

/// `std_msgs/Float64MultiArray` as carried over rosbridge.
///
/// Only the `data` field is populated; the layout is left to its default on
/// the ROS side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Float64MultiArray {
    pub data: Vec<f64>,
}

impl Float64MultiArray {
    pub const ROS_TYPE: &'static str = "std_msgs/Float64MultiArray";
}

/// `sensor_msgs/JointState` as carried over rosbridge.
///
/// `name` and `position` are parallel arrays.  Publishers are not required to
/// fill both, so either may be missing or shorter than the other.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointState {
    #[serde(default)]
    pub name: Vec<String>,
    /// Joint positions in radians.
    #[serde(default)]
    pub position: Vec<f64>,
}

impl JointState {
    pub const ROS_TYPE: &'static str = "sensor_msgs/JointState";
}

/// Error type shared by the servo controller, the rosbridge transport and the
/// CLI.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BonicError {
    #[error("Unknown servo joint: {0}")]
    UnknownJoint(String),

    #[error("Invalid angle for {joint}: not a number")]
    InvalidAngle { joint: String },

    #[error("Failed to publish servo command: {0}")]
    Publish(String),

    #[error("Invalid joint table: {0}")]
    InvalidJointTable(String),

    #[error("Transport Error: {0}")]
    Transport(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_spec_clamps_to_nearest_bound() {
        let spec = JointSpec::new("left_elbow_joint", 0.0, 50.0);
        assert_eq!(spec.clamp(75.0), 50.0);
        assert_eq!(spec.clamp(-10.0), 0.0);
        assert_eq!(spec.clamp(25.0), 25.0);
    }

    #[test]
    fn joint_spec_range_is_inclusive() {
        let spec = JointSpec::new("neck_yaw_joint", -90.0, 90.0);
        assert!(spec.contains(-90.0));
        assert!(spec.contains(90.0));
        assert!(!spec.contains(90.5));
        assert_eq!(spec.range(), (-90.0, 90.0));
    }

    #[test]
    fn joint_state_tolerates_missing_fields() {
        let state: JointState = serde_json::from_str(r#"{"name":["a","b"]}"#).unwrap();
        assert_eq!(state.name, vec!["a", "b"]);
        assert!(state.position.is_empty());

        let empty: JointState = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, JointState::default());
    }

    #[test]
    fn float64_multi_array_serialises_data_field() {
        let msg = Float64MultiArray {
            data: vec![0.5, -1.0],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["data"][0], 0.5);
        assert_eq!(json["data"][1], -1.0);
    }

    #[test]
    fn bonic_error_display() {
        let err = BonicError::UnknownJoint("tail_joint".to_string());
        assert_eq!(err.to_string(), "Unknown servo joint: tail_joint");

        let err = BonicError::Publish("socket closed".to_string());
        assert!(err.to_string().contains("socket closed"));
    }
}
