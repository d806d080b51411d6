//! Socket-controlled motion sequencer for a differential-drive robot.
//!
//! Text commands such as `10F;R90L` arrive over TCP, are queued, and run one
//! at a time; each motion stops itself once the pose feed shows its target
//! distance or angle has been reached.

pub mod config;
pub mod controller;
pub mod messages;
pub mod motion;
pub mod runtime;
pub mod session;
pub mod sim;
