// Pose-feedback completion tracking for the single in-flight motion

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use tracing::{debug, info};

use super::actuator::WheelSpeeds;
use super::intent::{CHAINED_TURN, MotionIntent, MotionKind, Turn};
use crate::messages::Pose;

/// Normalize angle to (-π, π]
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let a = (angle + PI).rem_euclid(TAU) - PI;
    if a <= -PI { a + TAU } else { a }
}

/// Heading progress credited for one sample
///
/// Only motion in the commanded direction counts. A large step against the
/// commanded direction is read as a wrap across ±π. Small counter steps are
/// ignored. This assumes a single tick never turns more than π/2.
pub fn rotation_step(turn: Turn, delta: f64) -> f64 {
    match turn {
        Turn::Left => {
            if delta > 0.0 {
                delta
            } else if delta < -FRAC_PI_2 {
                TAU + delta
            } else {
                0.0
            }
        }
        Turn::Right => {
            if delta < 0.0 {
                delta.abs()
            } else if delta > FRAC_PI_2 {
                TAU - delta
            } else {
                0.0
            }
        }
    }
}

/// The single in-flight motion
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveMotion {
    pub kind: MotionKind,
    /// Distance, or radians while tracking heading
    pub target: f64,
    /// Accumulated distance or radians, non-decreasing while active
    pub progress: f64,
    /// Pose when the displacement started
    pub reference_pose: Pose,
    /// Heading at the previous sample
    pub reference_heading: f64,
    /// Drive distance left for the move phase of a turn-then-move
    pub pending_distance: Option<f64>,
}

/// Outcome of feeding one pose sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    Idle,
    Running,
    /// A turn-then-move finished turning and is now driving `distance`
    PhaseChanged { distance: f64 },
    Completed { kind: MotionKind, target: f64 },
}

#[derive(Debug, Clone)]
pub struct MotionStateMachine {
    active: Option<ActiveMotion>,
    wheels: WheelSpeeds,
    base_speed: f64,
}

impl MotionStateMachine {
    pub fn new(base_speed: f64) -> Self {
        Self {
            active: None,
            wheels: WheelSpeeds::stop(),
            base_speed,
        }
    }

    pub fn active(&self) -> Option<&ActiveMotion> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Current actuator command
    pub fn wheel_speeds(&self) -> WheelSpeeds {
        self.wheels
    }

    /// Start a motion from `pose`, replacing whatever was running
    pub fn arm(&mut self, intent: MotionIntent, pose: Pose) {
        if self.active.is_some() {
            debug!("Arming over an active motion, stopping it first");
            self.cancel();
        }

        let kind = intent.kind();
        let (target, pending_distance) = match intent {
            MotionIntent::TurnLeftThenMove(distance) | MotionIntent::TurnRightThenMove(distance) => {
                (CHAINED_TURN, Some(distance))
            }
            other => (other.magnitude(), None),
        };

        self.active = Some(ActiveMotion {
            kind,
            target,
            progress: 0.0,
            reference_pose: pose,
            reference_heading: pose.heading,
            pending_distance,
        });
        self.wheels = WheelSpeeds::for_kind(kind, self.base_speed);

        info!(
            "Armed {} target={:.3} wheels=({:.2}, {:.2})",
            kind.label(),
            target,
            self.wheels.left,
            self.wheels.right
        );
    }

    /// Stop the active motion, if any
    pub fn cancel(&mut self) {
        if let Some(motion) = self.active.take() {
            debug!(
                "Cancelled {} at {:.3}/{:.3}",
                motion.kind.label(),
                motion.progress,
                motion.target
            );
        }
        self.wheels = WheelSpeeds::stop();
    }

    /// Feed one pose sample and report what happened
    pub fn sample(&mut self, pose: Pose) -> Progress {
        let Some(motion) = self.active.as_mut() else {
            return Progress::Idle;
        };

        match motion.kind.turn() {
            None => {
                motion.progress = pose.distance_to(&motion.reference_pose);
            }
            Some(turn) => {
                let delta = normalize_angle(pose.heading - motion.reference_heading);
                motion.progress += rotation_step(turn, delta);
                motion.reference_heading = pose.heading;
            }
        }

        if motion.progress < motion.target {
            return Progress::Running;
        }

        if let Some(distance) = motion.pending_distance.take() {
            motion.kind = MotionKind::Forward;
            motion.target = distance;
            motion.progress = 0.0;
            motion.reference_pose = pose;
            motion.reference_heading = pose.heading;
            self.wheels = WheelSpeeds::for_kind(MotionKind::Forward, self.base_speed);
            info!("Turn complete, driving forward {:.3}", distance);
            return Progress::PhaseChanged { distance };
        }

        let (kind, target) = (motion.kind, motion.target);
        info!(
            "Completed {} target={:.3} progress={:.3}",
            kind.label(),
            target,
            motion.progress
        );
        self.active = None;
        self.wheels = WheelSpeeds::stop();
        Progress::Completed { kind, target }
    }
}
