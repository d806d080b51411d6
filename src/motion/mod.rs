// Motion command sequencing for a differential-drive base
//
// Provides:
// - Text command parser (10F, R90L, D5B, ...)
// - Differential-drive wheel speed mapping
// - Pose-feedback completion state machine
// - FIFO sequencer driving the state machine

pub mod actuator;
pub mod intent;
pub mod parser;
mod sequencer;
pub mod state_machine;

pub use actuator::WheelSpeeds;
pub use intent::{MotionIntent, MotionKind, Turn};
pub use parser::{ParseError, parse, split_sequence};
pub use sequencer::{FORMAT_USAGE, Sequencer};
pub use state_machine::{ActiveMotion, MotionStateMachine, Progress};
