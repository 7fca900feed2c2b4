//! A servo controller backed either by a live rosbridge connection or by the
//! in-process simulator.

use std::sync::Arc;
use std::time::Duration;

use bonic_middleware::ServoLink;
use bonic_servo::{FeedbackHandler, JointTable, ServoController, SimSink};
use bonic_types::BonicError;
use tokio::runtime::Runtime;

use crate::config::Config;

enum Backend {
    /// The runtime drives the link's socket tasks and must outlive it.
    Live { link: ServoLink, runtime: Runtime },
    Sim(SimSink),
}

pub struct Session {
    servo: Arc<ServoController>,
    backend: Backend,
}

impl Session {
    /// Connect to the rosbridge endpoint named in `cfg`.
    pub fn connect(cfg: &Config) -> Result<Self, BonicError> {
        let runtime = Runtime::new()
            .map_err(|e| BonicError::Transport(format!("failed to start tokio runtime: {e}")))?;
        let link = runtime.block_on(ServoLink::connect(
            &cfg.rosbridge_url(),
            JointTable::bonicbot(),
            &cfg.topics(),
        ))?;
        Ok(Self {
            servo: link.servo(),
            backend: Backend::Live { link, runtime },
        })
    }

    /// Run against the simulator: every command is echoed back as feedback.
    pub fn simulated() -> Self {
        let sink = SimSink::new();
        let servo = Arc::new(ServoController::new(JointTable::bonicbot(), sink.boxed()));
        Self {
            servo,
            backend: Backend::Sim(sink),
        }
    }

    pub fn servo(&self) -> &ServoController {
        &self.servo
    }

    pub fn is_live(&self) -> bool {
        matches!(self.backend, Backend::Live { .. })
    }

    /// Human-readable description of the backend.
    pub fn describe(&self) -> String {
        match &self.backend {
            Backend::Live { link, .. } => link.client().url().to_string(),
            Backend::Sim(_) => "simulator".to_string(),
        }
    }

    /// In simulation, report the last command back as joint feedback.  A
    /// live robot does this on its own.
    pub fn settle(&self) {
        if let Backend::Sim(sink) = &self.backend
            && let Some(state) = sink.echo_joint_state(self.servo.table())
        {
            self.servo.on_joint_state(&state);
        }
    }

    pub fn close(self) {
        if let Backend::Live { link, runtime } = self.backend {
            runtime.block_on(link.close());
            runtime.shutdown_timeout(Duration::from_millis(500));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonic_servo::joints::NECK_YAW;

    #[test]
    fn simulated_session_settles_to_commanded_angles() {
        let session = Session::simulated();
        assert!(!session.is_live());
        assert_eq!(session.describe(), "simulator");
        assert!(session.servo().last_feedback().is_none());

        session.servo().set_single(NECK_YAW, 42.0).unwrap();
        session.settle();

        assert!((session.servo().angle(NECK_YAW).unwrap() - 42.0).abs() < 1e-9);
        assert!(session.servo().last_feedback().is_some());
        session.close();
    }
}
