//! rosbridge JSON frames.
//!
//! Only the three operations the servo link needs are built here:
//! `advertise`, `publish` and `subscribe`.  Inbound traffic is reduced to
//! [`InboundFrame`]; any other op (service responses, status, …) is ignored.

use bonic_types::BonicError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// A rosbridge `publish` frame received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundFrame {
    pub topic: String,
    pub msg: Value,
}

/// Build a unique frame id such as `"publish:/joint_states:3f1c…"`.
fn frame_id(op: &str, topic: &str) -> String {
    format!("{op}:{topic}:{}", Uuid::new_v4())
}

/// `{"op":"advertise", ...}` – declare that this client publishes `topic`.
pub fn advertise(topic: &str, ros_type: &str) -> String {
    json!({
        "op": "advertise",
        "id": frame_id("advertise", topic),
        "topic": topic,
        "type": ros_type
    })
    .to_string()
}

/// `{"op":"subscribe", ...}` – ask the server to forward `topic`.
pub fn subscribe(topic: &str, ros_type: &str) -> String {
    json!({
        "op": "subscribe",
        "id": frame_id("subscribe", topic),
        "topic": topic,
        "type": ros_type
    })
    .to_string()
}

/// `{"op":"publish", ...}` carrying `msg` serialised as JSON.
///
/// # Errors
///
/// Returns [`BonicError::Serialization`] if `msg` cannot be represented as
/// JSON (e.g. a map with non-string keys).
pub fn publish<T: Serialize>(topic: &str, msg: &T) -> Result<String, BonicError> {
    let msg = serde_json::to_value(msg).map_err(|e| BonicError::Serialization(e.to_string()))?;
    Ok(json!({
        "op": "publish",
        "id": frame_id("publish", topic),
        "topic": topic,
        "msg": msg
    })
    .to_string())
}

/// Parse a text frame from the server.
///
/// Returns `Ok(None)` for well-formed frames that are not `publish` ops.
///
/// # Errors
///
/// Returns [`BonicError::Serialization`] when the text is not JSON, or is a
/// `publish` frame without a string `topic`.
pub fn parse_inbound(text: &str) -> Result<Option<InboundFrame>, BonicError> {
    let mut json: Value =
        serde_json::from_str(text).map_err(|e| BonicError::Serialization(e.to_string()))?;

    if json.get("op").and_then(Value::as_str) != Some("publish") {
        return Ok(None);
    }

    let topic = json
        .get("topic")
        .and_then(Value::as_str)
        .ok_or_else(|| BonicError::Serialization("publish frame without topic".to_string()))?
        .to_string();
    let msg = json.get_mut("msg").map(Value::take).unwrap_or(Value::Null);

    Ok(Some(InboundFrame { topic, msg }))
}
