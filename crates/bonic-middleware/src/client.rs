//! rosbridge WebSocket client.
//!
//! [`RosbridgeClient`] owns one WebSocket connection to a `rosbridge_server`:
//!
//! * **Outbound** – frames are queued on an unbounded channel and written by a
//!   dedicated task, so publishing never blocks and can be done from sync
//!   code such as [`CommandSink::publish`].
//!
//! * **Inbound** – a single reader task parses `publish` frames and routes
//!   them by topic to the attached [`FeedbackHandler`].  Handlers therefore
//!   run one at a time, in arrival order.
//!
//! The client does not reconnect.  Once the socket closes every publish
//! fails with [`BonicError::Publish`].  [`RosbridgeClient::close`] writes out
//! frames that were already queued before it stops.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bonic_servo::{CommandSink, FeedbackHandler};
use bonic_types::{BonicError, Float64MultiArray, JointState};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::frames;

type Routes = Arc<RwLock<HashMap<String, Arc<dyn FeedbackHandler>>>>;

/// How long [`RosbridgeClient::close`] waits for queued frames to be written.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// The sending half of the writer queue, shared by the client and every
/// [`TopicPublisher`].  `None` once the connection is closed; taking it out
/// drops the last sender, so the writer drains what is queued and stops.
#[derive(Clone)]
struct Outbox(Arc<RwLock<Option<mpsc::UnboundedSender<String>>>>);

impl Outbox {
    fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self(Arc::new(RwLock::new(Some(sender))))
    }

    /// Queue `frame`.  Returns `false` once the outbox is shut.
    fn send(&self, frame: String) -> bool {
        match self.0.read().as_ref() {
            Some(sender) => sender.send(frame).is_ok(),
            None => false,
        }
    }

    fn shut(&self) {
        self.0.write().take();
    }

    fn is_open(&self) -> bool {
        self.0.read().is_some()
    }
}

/// A live connection to a `rosbridge_server`.
pub struct RosbridgeClient {
    url: String,
    outbox: Outbox,
    routes: Routes,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl RosbridgeClient {
    /// Connect to `url` (e.g. `"ws://192.168.1.20:9090"`) and start the I/O
    /// tasks on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`BonicError::Transport`] when the WebSocket handshake fails.
    pub async fn connect(url: &str) -> Result<Self, BonicError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| BonicError::Transport(format!("connect to {url}: {e}")))?;
        info!(url, "connected to rosbridge");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let (sender, mut queue) = mpsc::unbounded_channel::<String>();
        let outbox = Outbox::new(sender);
        let routes: Routes = Arc::new(RwLock::new(HashMap::new()));

        let writer_outbox = outbox.clone();
        let writer = tokio::spawn(async move {
            while let Some(frame) = queue.recv().await {
                if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                    warn!(error = %e, "rosbridge write failed");
                    writer_outbox.shut();
                    break;
                }
            }
            let _ = ws_tx.close().await;
            debug!("rosbridge writer finished");
        });

        let reader_outbox = outbox.clone();
        let reader_routes = Arc::clone(&routes);
        let reader = tokio::spawn(async move {
            while let Some(msg) = ws_rx.next().await {
                match msg {
                    Ok(Message::Text(text)) => dispatch(&reader_routes, text.as_str()),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "rosbridge read failed");
                        break;
                    }
                }
            }
            // The server is gone: refuse further publishes.
            reader_outbox.shut();
            debug!("rosbridge reader finished");
        });

        Ok(Self {
            url: url.to_string(),
            outbox,
            routes,
            reader,
            writer,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `true` until the server closes the socket, a write fails, or
    /// [`close`][Self::close] is called.
    pub fn is_connected(&self) -> bool {
        self.outbox.is_open()
    }

    /// Queue a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns [`BonicError::Transport`] once the connection has closed.
    pub fn send_frame(&self, frame: String) -> Result<(), BonicError> {
        if self.outbox.send(frame) {
            Ok(())
        } else {
            Err(BonicError::Transport(format!(
                "rosbridge connection to {} closed",
                self.url
            )))
        }
    }

    /// Advertise `topic` and return a [`TopicPublisher`] for it.
    pub fn publisher(&self, topic: &str, ros_type: &str) -> Result<TopicPublisher, BonicError> {
        self.send_frame(frames::advertise(topic, ros_type))?;
        debug!(topic, ros_type, "advertised topic");
        Ok(TopicPublisher {
            topic: topic.to_string(),
            outbox: self.outbox.clone(),
        })
    }

    /// Subscribe to `topic` and hand every `sensor_msgs/JointState` frame on
    /// it to `handler`.  A later call for the same topic replaces the handler.
    pub fn attach_feedback(
        &self,
        topic: &str,
        handler: Arc<dyn FeedbackHandler>,
    ) -> Result<(), BonicError> {
        self.routes.write().insert(topic.to_string(), handler);
        self.send_frame(frames::subscribe(topic, JointState::ROS_TYPE))?;
        debug!(topic, "subscribed to joint feedback");
        Ok(())
    }

    /// Refuse further publishes, wait for already queued frames to be
    /// written, then stop both I/O tasks.
    pub async fn close(self) {
        self.outbox.shut();
        let writer_abort = self.writer.abort_handle();
        if tokio::time::timeout(DRAIN_TIMEOUT, self.writer).await.is_err() {
            warn!(url = %self.url, "timed out flushing queued rosbridge frames");
            writer_abort.abort();
        }
        self.reader.abort();
        info!(url = %self.url, "rosbridge connection closed");
    }
}

/// Route one inbound text frame.  Bad frames are logged and dropped.
fn dispatch(routes: &Routes, text: &str) {
    let frame = match frames::parse_inbound(text) {
        Ok(Some(frame)) => frame,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "dropping malformed rosbridge frame");
            return;
        }
    };

    let Some(handler) = routes.read().get(&frame.topic).cloned() else {
        return;
    };

    match serde_json::from_value::<JointState>(frame.msg) {
        Ok(state) => handler.on_joint_state(&state),
        Err(e) => warn!(topic = %frame.topic, error = %e, "dropping malformed joint state"),
    }
}

/// Publishes onto one advertised topic.  Cheap to clone.
#[derive(Clone)]
pub struct TopicPublisher {
    topic: String,
    outbox: Outbox,
}

impl TopicPublisher {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl CommandSink for TopicPublisher {
    fn publish(&self, command: &Float64MultiArray) -> Result<(), BonicError> {
        let frame = frames::publish(&self.topic, command)?;
        if self.outbox.send(frame) {
            Ok(())
        } else {
            Err(BonicError::Publish(format!(
                "rosbridge connection closed, {} not sent",
                self.topic
            )))
        }
    }
}
