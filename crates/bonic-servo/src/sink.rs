//! Transport seams for the servo pipeline.
//!
//! The controller never opens a connection itself.  It publishes through a
//! [`CommandSink`] handed to it at construction, and a transport delivers
//! joint feedback by calling a [`FeedbackHandler`].  Transports can be swapped
//! (rosbridge, in-process simulation, …) without touching the command logic.

use bonic_types::{BonicError, Float64MultiArray, JointState};

/// Outbound channel for servo command arrays.
pub trait CommandSink: Send + Sync {
    /// Publish one command array.
    ///
    /// # Errors
    ///
    /// Returns [`BonicError::Publish`] (or a transport-specific variant that
    /// the controller wraps into one) when the message cannot be handed to
    /// the transport.
    fn publish(&self, command: &Float64MultiArray) -> Result<(), BonicError>;
}

/// Inbound channel for joint feedback.
///
/// Implementations must never panic or fail the transport: a bad frame is
/// logged and dropped.
pub trait FeedbackHandler: Send + Sync {
    fn on_joint_state(&self, state: &JointState);
}

impl<T: CommandSink + ?Sized> CommandSink for std::sync::Arc<T> {
    fn publish(&self, command: &Float64MultiArray) -> Result<(), BonicError> {
        (**self).publish(command)
    }
}

impl<T: FeedbackHandler + ?Sized> FeedbackHandler for std::sync::Arc<T> {
    fn on_joint_state(&self, state: &JointState) {
        (**self).on_joint_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Minimal in-process sink used only for tests.
    struct CountingSink {
        published: Mutex<usize>,
    }

    impl CommandSink for CountingSink {
        fn publish(&self, _command: &Float64MultiArray) -> Result<(), BonicError> {
            *self.published.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn arc_sink_forwards_to_inner() {
        let sink = Arc::new(CountingSink {
            published: Mutex::new(0),
        });
        let shared: Arc<dyn CommandSink> = sink.clone();
        shared.publish(&Float64MultiArray::default()).unwrap();
        shared.publish(&Float64MultiArray::default()).unwrap();
        assert_eq!(*sink.published.lock().unwrap(), 2);
    }
}
