// Loop rate, motion constants, topics, listen address, simulator geometry
use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

// Pose feed considered stale after this long without a sample (reported, never stops motion)
pub const POSE_TIMEOUT: Duration = Duration::from_millis(500);

// Trace the pose every N ticks
pub const POSE_TRACE_EVERY: u64 = 500;

// Motion
pub const BASE_SPEED: f64 = 5.0; // wheel speed units shared by every motion
pub const TURN_SPEED_RATIO: f64 = 0.6; // rotations run the wheels at this fraction of BASE_SPEED

// TCP session server
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9999";

// Zenoh topics
pub const TOPIC_POSE: &str = "lbot/state/pose"; // pose feed (in)
pub const TOPIC_WHEELS: &str = "lbot/rt/wheels"; // actuation (out)
pub const TOPIC_HEALTH: &str = "lbot/state/health"; // health status (out)

// Built-in simulator (e-puck sized, units are centimetres)
pub const SIM_AXLE_LENGTH: f64 = 5.1;
pub const SIM_ARENA_SIZE: f64 = 120.0;
pub const SIM_START_X: f64 = 60.0;
pub const SIM_START_Y: f64 = 60.0;
pub const SIM_ROBOT_RADIUS: f64 = 3.7;

/// Command line options for the runtime binary
#[derive(Debug, Clone, Parser)]
#[command(name = "lbot-runtime", about = "Socket-controlled motion sequencer for a differential-drive robot")]
pub struct Args {
    /// Address the text command server listens on
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: SocketAddr,

    /// Control loop rate in Hz
    #[arg(long, default_value_t = LOOP_HZ, value_parser = clap::value_parser!(u64).range(1..))]
    pub loop_hz: u64,

    /// Base wheel speed used by every motion
    #[arg(long, default_value_t = BASE_SPEED, value_parser = parse_base_speed)]
    pub base_speed: f64,

    /// Drive the built-in simulator instead of listening for poses on zenoh
    #[arg(long)]
    pub sim: bool,

    /// Simulator start position (x)
    #[arg(long, default_value_t = SIM_START_X)]
    pub start_x: f64,

    /// Simulator start position (y)
    #[arg(long, default_value_t = SIM_START_Y)]
    pub start_y: f64,

    /// Simulator start heading in radians
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub start_heading: f64,
}

/// Base speed must be a finite, strictly positive number
fn parse_base_speed(s: &str) -> Result<f64, String> {
    let speed: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("base speed must be positive, got {}", s))
    }
}

impl Args {
    /// Tick period derived from the loop rate, at least MIN_TICK_PERIOD
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.loop_hz.max(1) as f64).max(MIN_TICK_PERIOD)
    }
}
