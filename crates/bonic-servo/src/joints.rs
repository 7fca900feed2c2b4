//! [`JointTable`] – the fixed set of controllable joints.
//!
//! A table pairs every joint's [`JointSpec`] (its inclusive degree range) with
//! the order in which joint values are laid out in the outbound command
//! array.  The order is the order the specs were supplied in, so every ordered
//! name always has a spec and the command array length always equals the
//! number of joints.

use std::collections::{BTreeMap, HashMap};

use bonic_types::{BonicError, JointSpec};

pub const LEFT_SHOULDER: &str = "left_shoulder_pitch_joint";
pub const LEFT_ELBOW: &str = "left_elbow_joint";
pub const RIGHT_SHOULDER: &str = "right_shoulder_pitch_joint";
pub const RIGHT_ELBOW: &str = "right_elbow_joint";
pub const LEFT_GRIPPER: &str = "left_gripper_finger1_joint";
pub const RIGHT_GRIPPER: &str = "right_gripper_finger1_joint";
pub const NECK_YAW: &str = "neck_yaw_joint";

/// Immutable joint table: ranges plus command-array order.
#[derive(Debug, Clone)]
pub struct JointTable {
    specs: Vec<JointSpec>,
    index: HashMap<String, usize>,
}

impl JointTable {
    /// Build a table from `specs`, taken in command-array order.
    ///
    /// # Errors
    ///
    /// Returns [`BonicError::InvalidJointTable`] when the list is empty, a
    /// joint name appears twice, or a range has `min > max` (or a NaN bound).
    pub fn new(specs: Vec<JointSpec>) -> Result<Self, BonicError> {
        if specs.is_empty() {
            return Err(BonicError::InvalidJointTable(
                "at least one joint is required".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            if spec.min_deg.is_nan() || spec.max_deg.is_nan() || spec.min_deg > spec.max_deg {
                return Err(BonicError::InvalidJointTable(format!(
                    "joint '{}' has an invalid range [{}, {}]",
                    spec.name, spec.min_deg, spec.max_deg
                )));
            }
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(BonicError::InvalidJointTable(format!(
                    "joint '{}' is listed more than once",
                    spec.name
                )));
            }
        }

        Ok(Self { specs, index })
    }

    /// The seven-servo BonicBot layout: two arms, two gripper fingers and the
    /// neck, in the order the position controller expects them.
    pub fn bonicbot() -> Self {
        let specs = vec![
            JointSpec::new(LEFT_SHOULDER, -45.0, 180.0),
            JointSpec::new(LEFT_ELBOW, 0.0, 50.0),
            JointSpec::new(RIGHT_SHOULDER, -45.0, 180.0),
            JointSpec::new(RIGHT_ELBOW, 0.0, 50.0),
            JointSpec::new(LEFT_GRIPPER, -45.0, 60.0),
            JointSpec::new(RIGHT_GRIPPER, -45.0, 60.0),
            JointSpec::new(NECK_YAW, -90.0, 90.0),
        ];
        let index = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name.clone(), i))
            .collect();
        Self { specs, index }
    }

    /// Look up a joint's spec.
    ///
    /// # Errors
    ///
    /// Returns [`BonicError::UnknownJoint`] when `name` is not in the table.
    pub fn spec(&self, name: &str) -> Result<&JointSpec, BonicError> {
        self.index
            .get(name)
            .map(|&i| &self.specs[i])
            .ok_or_else(|| BonicError::UnknownJoint(name.to_string()))
    }

    /// Position of `name` in the command array, if known.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Joint names in command-array order.
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|spec| spec.name.as_str())
    }

    /// Specs in command-array order.
    pub fn specs(&self) -> &[JointSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Every joint's `(min, max)` range in degrees.
    pub fn limits(&self) -> BTreeMap<String, (f64, f64)> {
        self.specs
            .iter()
            .map(|spec| (spec.name.clone(), spec.range()))
            .collect()
    }
}

impl Default for JointTable {
    fn default() -> Self {
        Self::bonicbot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonicbot_table_has_seven_joints_in_controller_order() {
        let table = JointTable::bonicbot();
        let order: Vec<&str> = table.order().collect();
        assert_eq!(
            order,
            vec![
                LEFT_SHOULDER,
                LEFT_ELBOW,
                RIGHT_SHOULDER,
                RIGHT_ELBOW,
                LEFT_GRIPPER,
                RIGHT_GRIPPER,
                NECK_YAW,
            ]
        );
        assert_eq!(table.len(), 7);
        assert_eq!(table.spec(NECK_YAW).unwrap().range(), (-90.0, 90.0));
        assert_eq!(table.spec(LEFT_GRIPPER).unwrap().range(), (-45.0, 60.0));
    }

    #[test]
    fn unknown_joint_lookup_fails() {
        let table = JointTable::bonicbot();
        assert_eq!(
            table.spec("tail_joint"),
            Err(BonicError::UnknownJoint("tail_joint".to_string()))
        );
        assert_eq!(table.position("tail_joint"), None);
    }

    #[test]
    fn duplicate_joint_is_rejected() {
        let result = JointTable::new(vec![
            JointSpec::new("a", 0.0, 10.0),
            JointSpec::new("a", -5.0, 5.0),
        ]);
        assert!(matches!(result, Err(BonicError::InvalidJointTable(_))));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let result = JointTable::new(vec![JointSpec::new("a", 10.0, 0.0)]);
        assert!(matches!(result, Err(BonicError::InvalidJointTable(_))));

        let result = JointTable::new(vec![JointSpec::new("a", f64::NAN, 0.0)]);
        assert!(matches!(result, Err(BonicError::InvalidJointTable(_))));
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(
            JointTable::new(Vec::new()),
            Err(BonicError::InvalidJointTable(_))
        ));
    }

    #[test]
    fn custom_table_keeps_supplied_order() {
        let table = JointTable::new(vec![
            JointSpec::new("b", -5.0, 5.0),
            JointSpec::new("a", 0.0, 10.0),
        ])
        .unwrap();
        assert_eq!(table.position("b"), Some(0));
        assert_eq!(table.position("a"), Some(1));
        assert_eq!(table.limits()["a"], (0.0, 10.0));
    }
}
