// FIFO command queue on top of the motion state machine

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use super::intent::MotionIntent;
use super::parser::{ParseError, parse};
use super::state_machine::{MotionStateMachine, Progress};
use crate::messages::{Pose, Response};

pub const FORMAT_USAGE: &str = "Invalid command format. Use: XF;YB;ZL;WR (e.g., 10F;5R)";

pub struct Sequencer {
    machine: MotionStateMachine,
    queue: VecDeque<String>,
}

impl Sequencer {
    pub fn new(base_speed: f64) -> Self {
        Self {
            machine: MotionStateMachine::new(base_speed),
            queue: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &MotionStateMachine {
        &self.machine
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Tokens waiting to run, oldest first
    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    /// Accept a sequence of tokens
    ///
    /// Every token is validated up front and each failure is reported on its
    /// own. Valid tokens are queued behind an active motion; when idle the
    /// queue is replaced and the first token starts right away.
    pub fn submit(&mut self, tokens: &[&str], pose: Pose, out: &mut Vec<Response>) {
        let mut valid = Vec::with_capacity(tokens.len());
        for token in tokens {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match parse(token) {
                Ok(_) => valid.push(token.to_string()),
                Err(e) => out.push(invalid_movement(token, &e)),
            }
        }

        if valid.is_empty() {
            out.push(Response::Error(FORMAT_USAGE.to_string()));
            return;
        }

        if self.machine.is_active() {
            let count = valid.len();
            self.queue.extend(valid);
            info!("Queued {} commands ({} waiting)", count, self.queue.len());
            out.push(Response::Info(format!("Added {} commands to queue", count)));
            return;
        }

        self.queue.clear();
        self.queue.extend(valid);
        self.start_next(pose, out);
    }

    /// Feed the tick's pose; advances the queue when a motion completes
    pub fn on_tick(&mut self, pose: Pose, out: &mut Vec<Response>) {
        match self.machine.sample(pose) {
            Progress::Idle | Progress::Running => {}
            Progress::PhaseChanged { distance } => {
                out.push(Response::Ok(format!(
                    "Rotation complete, now moving forward {:.1} units",
                    distance
                )));
            }
            Progress::Completed { kind, target } => {
                let text = match kind.turn() {
                    Some(_) => format!(
                        "Completed {} rotation of {:.1} degrees",
                        kind.label(),
                        target.to_degrees()
                    ),
                    None => format!("Completed {} movement of {:.1} units", kind.label(), target),
                };
                out.push(Response::Ok(text));
                self.start_next(pose, out);
            }
        }
    }

    /// Stop the robot and drop everything queued
    pub fn on_stop(&mut self, out: &mut Vec<Response>) {
        self.machine.cancel();
        if !self.queue.is_empty() {
            debug!("Dropping {} queued commands", self.queue.len());
        }
        self.queue.clear();
        out.push(Response::Ok(
            "Robot stopped and command queue cleared".to_string(),
        ));
    }

    /// Pop tokens until one arms, or report that the queue is done
    fn start_next(&mut self, pose: Pose, out: &mut Vec<Response>) {
        while let Some(token) = self.queue.pop_front() {
            match parse(&token) {
                Ok(intent) => {
                    self.machine.arm(intent, pose);
                    out.push(Response::Ok(acknowledge(intent)));
                    return;
                }
                Err(e) => {
                    warn!("Skipping queued command {:?}: {}", token, e);
                    out.push(invalid_movement(&token, &e));
                }
            }
        }
        info!("Command queue drained");
        out.push(Response::Ok("All commands completed".to_string()));
    }
}

fn invalid_movement(token: &str, err: &ParseError) -> Response {
    Response::Error(format!("Invalid movement '{}': {}", token, err))
}

fn acknowledge(intent: MotionIntent) -> String {
    match intent {
        MotionIntent::Forward(d) => format!("Moving forward for {:.1} units", d),
        MotionIntent::Backward(d) => format!("Moving backward for {:.1} units", d),
        MotionIntent::RotateLeft(rad) => format!("Rotating left {:.1} degrees", rad.to_degrees()),
        MotionIntent::RotateRight(rad) => {
            format!("Rotating right {:.1} degrees", rad.to_degrees())
        }
        MotionIntent::TurnLeftThenMove(d) => format!("Turning left 90° then moving {:.1} units", d),
        MotionIntent::TurnRightThenMove(d) => {
            format!("Turning right 90° then moving {:.1} units", d)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::actuator::WheelSpeeds;
    use crate::motion::intent::MotionKind;

    const S: f64 = 5.0;

    fn origin() -> Pose {
        Pose::new(0.0, 0.0, 0.0)
    }

    fn lines(out: &[Response]) -> Vec<String> {
        out.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_submit_idle_arms_first_and_queues_rest() {
        let mut seq = Sequencer::new(S);
        let mut out = Vec::new();
        seq.submit(&["10F", "5R"], origin(), &mut out);

        let motion = seq.state().active().expect("armed");
        assert_eq!(motion.kind, MotionKind::Forward);
        assert_eq!(motion.target, 10.0);
        assert_eq!(seq.queued().collect::<Vec<_>>(), vec!["5R"]);
        assert_eq!(lines(&out), vec!["OK: Moving forward for 10.0 units"]);
    }

    #[test]
    fn test_submit_while_active_appends() {
        let mut seq = Sequencer::new(S);
        let mut out = Vec::new();
        seq.submit(&["10F", "5R"], origin(), &mut out);
        out.clear();

        seq.submit(&["R90L"], Pose::new(3.0, 0.0, 0.0), &mut out);
        // the running motion is untouched
        let motion = seq.state().active().unwrap();
        assert_eq!(motion.kind, MotionKind::Forward);
        assert_eq!(motion.reference_pose, origin());
        assert_eq!(seq.queued().collect::<Vec<_>>(), vec!["5R", "R90L"]);
        assert_eq!(lines(&out), vec!["INFO: Added 1 commands to queue"]);
    }

    #[test]
    fn test_malformed_token_reported_without_dropping_others() {
        let mut seq = Sequencer::new(S);
        let mut out = Vec::new();
        seq.submit(&["10F", "bad", "5R"], origin(), &mut out);

        assert_eq!(seq.state().active().unwrap().kind, MotionKind::Forward);
        assert_eq!(seq.queued().collect::<Vec<_>>(), vec!["5R"]);
        assert_eq!(out.len(), 2);
        assert!(out[0].is_error());
        assert!(out[0].text().contains("'bad'"));
        assert_eq!(out[1].to_string(), "OK: Moving forward for 10.0 units");
    }

    #[test]
    fn test_all_invalid_reports_format_usage() {
        let mut seq = Sequencer::new(S);
        let mut out = Vec::new();
        seq.submit(&["X", "-1F"], origin(), &mut out);
        assert!(!seq.state().is_active());
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(Response::is_error));
        assert_eq!(out[2].text(), FORMAT_USAGE);
    }

    #[test]
    fn test_completion_advances_queue() {
        let mut seq = Sequencer::new(S);
        let mut out = Vec::new();
        seq.submit(&["2F", "R90L"], origin(), &mut out);
        out.clear();

        seq.on_tick(Pose::new(1.0, 0.0, 0.0), &mut out);
        assert!(out.is_empty());

        let reached = Pose::new(2.0, 0.0, 0.0);
        seq.on_tick(reached, &mut out);
        assert_eq!(
            lines(&out),
            vec![
                "OK: Completed forward movement of 2.0 units",
                "OK: Rotating left 90.0 degrees",
            ]
        );
        let motion = seq.state().active().unwrap();
        assert_eq!(motion.kind, MotionKind::RotateLeft);
        assert_eq!(motion.reference_heading, 0.0);
        assert_eq!(seq.queue_len(), 0);
        out.clear();

        seq.on_tick(Pose::new(2.0, 0.0, 1.0), &mut out);
        seq.on_tick(Pose::new(2.0, 0.0, 1.6), &mut out);
        assert_eq!(
            lines(&out),
            vec![
                "OK: Completed rotate_left rotation of 90.0 degrees",
                "OK: All commands completed",
            ]
        );
        assert!(!seq.state().is_active());
        assert!(seq.state().wheel_speeds().is_stopped());
    }

    #[test]
    fn test_chained_command_is_one_queue_entry() {
        let mut seq = Sequencer::new(S);
        let mut out = Vec::new();
        seq.submit(&["3L", "1B"], origin(), &mut out);
        assert_eq!(
            lines(&out),
            vec!["OK: Turning left 90° then moving 3.0 units"]
        );
        out.clear();

        seq.on_tick(Pose::new(0.0, 0.0, 1.0), &mut out);
        seq.on_tick(Pose::new(0.0, 0.0, 1.6), &mut out);
        assert_eq!(
            lines(&out),
            vec!["OK: Rotation complete, now moving forward 3.0 units"]
        );
        // the queued 1B has not started yet
        assert_eq!(seq.queue_len(), 1);
        assert_eq!(seq.state().wheel_speeds(), WheelSpeeds::new(S, S));
        out.clear();

        seq.on_tick(Pose::new(0.0, 3.0, 1.6), &mut out);
        assert_eq!(
            lines(&out),
            vec![
                "OK: Completed forward movement of 3.0 units",
                "OK: Moving backward for 1.0 units",
            ]
        );
    }

    #[test]
    fn test_stop_cancels_and_clears() {
        let mut seq = Sequencer::new(S);
        let mut out = Vec::new();
        seq.submit(&["10F", "5R", "R45L"], origin(), &mut out);
        out.clear();

        seq.on_stop(&mut out);
        assert!(!seq.state().is_active());
        assert!(seq.state().wheel_speeds().is_stopped());
        assert_eq!(seq.queue_len(), 0);
        assert_eq!(lines(&out), vec!["OK: Robot stopped and command queue cleared"]);

        // idempotent
        seq.on_stop(&mut out);
        assert_eq!(out.len(), 2);
        assert!(!seq.state().is_active());

        // ticks after a stop do nothing
        out.clear();
        seq.on_tick(Pose::new(50.0, 0.0, 0.0), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_submit_after_stop_starts_fresh() {
        let mut seq = Sequencer::new(S);
        let mut out = Vec::new();
        seq.submit(&["10F", "5R"], origin(), &mut out);
        seq.on_stop(&mut out);
        out.clear();

        seq.submit(&["1B"], Pose::new(4.0, 0.0, 0.0), &mut out);
        let motion = seq.state().active().unwrap();
        assert_eq!(motion.kind, MotionKind::Backward);
        assert_eq!(motion.reference_pose, Pose::new(4.0, 0.0, 0.0));
        assert_eq!(seq.queue_len(), 0);
    }
}
