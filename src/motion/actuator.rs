// Differential-drive actuator mapping
// Converts a motion kind into left/right wheel speeds.

use serde::{Deserialize, Serialize};

use super::intent::{MotionKind, Turn};
use crate::config::TURN_SPEED_RATIO;

/// Wheel speed command for the two drive wheels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct WheelSpeeds {
    pub left: f64,
    pub right: f64,
}

impl WheelSpeeds {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn stop() -> Self {
        Self::default()
    }

    pub fn is_stopped(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }

    /// Speeds for a motion kind at the given base speed
    ///
    /// Chained kinds map to their turn phase: once the turn completes the
    /// active motion becomes a plain `Forward`.
    pub fn for_kind(kind: MotionKind, base_speed: f64) -> Self {
        let turn_speed = base_speed * TURN_SPEED_RATIO;
        match (kind, kind.turn()) {
            (MotionKind::Forward, _) => Self::new(base_speed, base_speed),
            (MotionKind::Backward, _) => Self::new(-base_speed, -base_speed),
            (_, Some(Turn::Left)) => Self::new(-turn_speed, turn_speed),
            (_, Some(Turn::Right)) => Self::new(turn_speed, -turn_speed),
            // every other kind has a turn direction
            (_, None) => Self::stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: f64 = 5.0;

    #[test]
    fn test_stop() {
        let wheels = WheelSpeeds::stop();
        assert_eq!(wheels.left, 0.0);
        assert_eq!(wheels.right, 0.0);
        assert!(wheels.is_stopped());
    }

    #[test]
    fn test_straight_motion() {
        assert_eq!(WheelSpeeds::for_kind(MotionKind::Forward, S), WheelSpeeds::new(5.0, 5.0));
        assert_eq!(WheelSpeeds::for_kind(MotionKind::Backward, S), WheelSpeeds::new(-5.0, -5.0));
    }

    #[test]
    fn test_rotation_only() {
        // Left spins counter-clockwise: left wheel back, right wheel forward
        let left = WheelSpeeds::for_kind(MotionKind::RotateLeft, S);
        assert!((left.left + 3.0).abs() < 1e-12);
        assert!((left.right - 3.0).abs() < 1e-12);

        let right = WheelSpeeds::for_kind(MotionKind::RotateRight, S);
        assert!((right.left - 3.0).abs() < 1e-12);
        assert!((right.right + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_chained_kinds_use_turn_phase() {
        assert_eq!(
            WheelSpeeds::for_kind(MotionKind::TurnLeftThenMove, S),
            WheelSpeeds::for_kind(MotionKind::RotateLeft, S)
        );
        assert_eq!(
            WheelSpeeds::for_kind(MotionKind::TurnRightThenMove, S),
            WheelSpeeds::for_kind(MotionKind::RotateRight, S)
        );
    }

    #[test]
    fn test_scales_with_base_speed() {
        let wheels = WheelSpeeds::for_kind(MotionKind::Forward, 2.0);
        assert_eq!(wheels, WheelSpeeds::new(2.0, 2.0));
        assert!(!wheels.is_stopped());
    }
}
