//! Session handler for the robot.
//!
//! [`RobotController`] is the single owner of the command queue and the
//! active motion. The runtime hands it inbound lines and per-tick poses and
//! drains the outbound lines it produces.

use tracing::{debug, info};

use crate::messages::{Pose, Response};
use crate::motion::{FORMAT_USAGE, Sequencer, WheelSpeeds, split_sequence};

/// What the runtime should do after a line has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Continue,
    Quit,
}

pub struct RobotController {
    sequencer: Sequencer,
    pose: Pose,
    outbox: Vec<Response>,
}

impl RobotController {
    /// `pose` is used as the robot's position until the first tick arrives
    pub fn new(base_speed: f64, pose: Pose) -> Self {
        Self {
            sequencer: Sequencer::new(base_speed),
            pose,
            outbox: Vec::new(),
        }
    }

    /// Connection banner for a newly connected peer
    pub fn greeting(&mut self) {
        self.outbox.push(Response::Hello(
            "Connected to Enki Robot Controller".to_string(),
        ));
        self.outbox.push(Response::Commands(
            "Use format XF;YB;ZL;WR (e.g., 10F;5R) or stop, status, quit".to_string(),
        ));
    }

    /// Handle one inbound command line
    pub fn handle_line(&mut self, line: &str) -> SessionAction {
        let line = line.trim();
        info!("Received command: {:?}", line);

        if line.eq_ignore_ascii_case("status") {
            let status = self.status_line();
            self.outbox.push(Response::Status(status));
        } else if line.eq_ignore_ascii_case("quit") {
            self.outbox.push(Response::Ok("Goodbye!".to_string()));
            return SessionAction::Quit;
        } else if line.eq_ignore_ascii_case("stop") {
            self.sequencer.on_stop(&mut self.outbox);
        } else {
            let tokens = split_sequence(line);
            if tokens.is_empty() {
                self.outbox.push(Response::Error(FORMAT_USAGE.to_string()));
            } else {
                self.sequencer.submit(&tokens, self.pose, &mut self.outbox);
            }
        }

        SessionAction::Continue
    }

    /// Feed the tick's pose snapshot
    pub fn on_tick(&mut self, pose: Pose) {
        self.pose = pose;
        self.sequencer.on_tick(pose, &mut self.outbox);
    }

    /// Take every outbound line produced so far
    pub fn drain_responses(&mut self) -> Vec<Response> {
        if !self.outbox.is_empty() {
            debug!("Flushing {} responses", self.outbox.len());
        }
        std::mem::take(&mut self.outbox)
    }

    /// Current actuator command
    pub fn wheel_speeds(&self) -> WheelSpeeds {
        self.sequencer.state().wheel_speeds()
    }

    /// Last pose seen
    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn is_moving(&self) -> bool {
        self.sequencer.state().is_active()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    fn status_line(&self) -> String {
        let wheels = self.wheel_speeds();
        format!(
            "pos=({:.2},{:.2}) angle={:.2} left_speed={:.2} right_speed={:.2}",
            self.pose.x, self.pose.y, self.pose.heading, wheels.left, wheels.right
        )
    }
}
