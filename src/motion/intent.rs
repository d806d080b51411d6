// Typed motion intents and the kinds an active motion can be in

use std::f64::consts::FRAC_PI_2;

/// A parsed motion command. Magnitudes are non-negative; direction is in the variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionIntent {
    /// Drive forward for a distance
    Forward(f64),
    /// Drive backward for a distance
    Backward(f64),
    /// Rotate counter-clockwise by an angle in radians
    RotateLeft(f64),
    /// Rotate clockwise by an angle in radians
    RotateRight(f64),
    /// Turn 90° left, then drive forward for a distance
    TurnLeftThenMove(f64),
    /// Turn 90° right, then drive forward for a distance
    TurnRightThenMove(f64),
}

/// Which way a rotation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    Forward,
    Backward,
    RotateLeft,
    RotateRight,
    TurnLeftThenMove,
    TurnRightThenMove,
}

/// Fixed pre-turn of a turn-then-move command
pub const CHAINED_TURN: f64 = FRAC_PI_2;

impl MotionIntent {
    pub fn kind(&self) -> MotionKind {
        match self {
            Self::Forward(_) => MotionKind::Forward,
            Self::Backward(_) => MotionKind::Backward,
            Self::RotateLeft(_) => MotionKind::RotateLeft,
            Self::RotateRight(_) => MotionKind::RotateRight,
            Self::TurnLeftThenMove(_) => MotionKind::TurnLeftThenMove,
            Self::TurnRightThenMove(_) => MotionKind::TurnRightThenMove,
        }
    }

    /// Distance (displacement) or radians (rotation) carried by the command
    pub fn magnitude(&self) -> f64 {
        match *self {
            Self::Forward(m)
            | Self::Backward(m)
            | Self::RotateLeft(m)
            | Self::RotateRight(m)
            | Self::TurnLeftThenMove(m)
            | Self::TurnRightThenMove(m) => m,
        }
    }
}

impl MotionKind {
    /// Rotation direction while this kind is being tracked by heading, if any
    pub fn turn(&self) -> Option<Turn> {
        match self {
            Self::RotateLeft | Self::TurnLeftThenMove => Some(Turn::Left),
            Self::RotateRight | Self::TurnRightThenMove => Some(Turn::Right),
            Self::Forward | Self::Backward => None,
        }
    }

    pub fn is_chained(&self) -> bool {
        matches!(self, Self::TurnLeftThenMove | Self::TurnRightThenMove)
    }

    /// Label used in outbound text
    pub fn label(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::RotateLeft => "rotate_left",
            Self::RotateRight => "rotate_right",
            Self::TurnLeftThenMove => "turn_left_then_move",
            Self::TurnRightThenMove => "turn_right_then_move",
        }
    }
}
