//! [`ServoLink`] – a [`ServoController`] wired to a rosbridge connection.
//!
//! Advertises the servo command topic, builds the controller on top of a
//! [`TopicPublisher`][crate::client::TopicPublisher], and subscribes the
//! controller to joint feedback.

use std::sync::Arc;

use bonic_servo::{JointTable, ServoController};
use bonic_types::{BonicError, Float64MultiArray};
use tracing::info;

use crate::client::RosbridgeClient;

/// Topic the position controller listens on.
pub const COMMAND_TOPIC: &str = "/servo_position_controller/commands";
/// Topic the robot reports joint positions on.
pub const FEEDBACK_TOPIC: &str = "/joint_states";

/// Topic names used by a [`ServoLink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServoTopics {
    pub command: String,
    pub feedback: String,
}

impl Default for ServoTopics {
    fn default() -> Self {
        Self {
            command: COMMAND_TOPIC.to_string(),
            feedback: FEEDBACK_TOPIC.to_string(),
        }
    }
}

/// A connected servo controller.
pub struct ServoLink {
    client: RosbridgeClient,
    servo: Arc<ServoController>,
}

impl ServoLink {
    /// Connect to `url` and wire up a controller for `table`.
    pub async fn connect(
        url: &str,
        table: JointTable,
        topics: &ServoTopics,
    ) -> Result<Self, BonicError> {
        let client = RosbridgeClient::connect(url).await?;
        Self::attach(client, table, topics)
    }

    /// Wire a controller onto an already connected client.
    pub fn attach(
        client: RosbridgeClient,
        table: JointTable,
        topics: &ServoTopics,
    ) -> Result<Self, BonicError> {
        let publisher = client.publisher(&topics.command, Float64MultiArray::ROS_TYPE)?;
        let servo = Arc::new(ServoController::new(table, Box::new(publisher)));
        client.attach_feedback(&topics.feedback, servo.clone())?;
        info!(
            command_topic = %topics.command,
            feedback_topic = %topics.feedback,
            joints = servo.table().len(),
            "servo link ready"
        );
        Ok(Self { client, servo })
    }

    /// The shared controller.  Clones stay valid after the link is closed,
    /// but every further command then fails to publish.
    pub fn servo(&self) -> Arc<ServoController> {
        Arc::clone(&self.servo)
    }

    pub fn client(&self) -> &RosbridgeClient {
        &self.client
    }

    /// Flush queued commands and close the connection.
    pub async fn close(self) {
        self.client.close().await;
    }
}
