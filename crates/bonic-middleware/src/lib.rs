//! `bonic-middleware` – rosbridge transport for the servo pipeline.
//!
//! Carries servo command arrays out to a `rosbridge_server` and joint
//! feedback back in, without caring what the numbers mean.
//!
//! # Modules
//!
//! - [`frames`] – builders and parser for the rosbridge JSON frames in use.
//! - [`client`] – [`RosbridgeClient`], a tokio-tungstenite WebSocket client
//!   with topic-routed feedback delivery.
//! - [`servo_link`] – [`ServoLink`], a controller wired onto a client.

pub mod client;
pub mod frames;
pub mod servo_link;

pub use client::{RosbridgeClient, TopicPublisher};
pub use servo_link::{COMMAND_TOPIC, FEEDBACK_TOPIC, ServoLink, ServoTopics};
