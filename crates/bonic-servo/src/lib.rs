//! `bonic-servo` – servo command pipeline for BonicBot.
//!
//! Turns requested joint angles (degrees) into validated, clamped,
//! fixed-order radian command arrays and keeps a cached view of joint state
//! refreshed from `/joint_states` feedback.
//!
//! # Modules
//!
//! - [`joints`] – the joint table: per-joint ranges and command-array order.
//! - [`sink`] – the [`CommandSink`] and [`FeedbackHandler`] seams a transport
//!   plugs into.
//! - [`controller`] – [`ServoController`], the command manager itself.
//! - [`presets`] – arm / gripper / neck conveniences and the wave script.
//! - [`sim`] – an in-process sink that records commands, for tests and
//!   offline runs.

pub mod controller;
pub mod joints;
pub mod presets;
pub mod sim;
pub mod sink;

pub use controller::ServoController;
pub use joints::JointTable;
pub use presets::{Arm, ServoGroup, Sleeper, ThreadSleeper, WAVE_STEPS};
pub use sim::SimSink;
pub use sink::{CommandSink, FeedbackHandler};
