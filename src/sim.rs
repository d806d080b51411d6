//! Kinematic simulator for a differential-drive robot
//!
//! Stands in for the external physics when the runtime is started with
//! `--sim`: integrates the commanded wheel speeds at the tick rate and reports
//! the pose the way the physics engine does (heading wrapped to (-π, π]).

use tracing::debug;

use crate::messages::Pose;
use crate::motion::WheelSpeeds;
use crate::motion::state_machine::normalize_angle;

/// Simulated robot in a square, walled arena
pub struct Simulator {
    pose: Pose,
    wheels: WheelSpeeds,
    /// Distance between the two wheels
    axle_length: f64,
    /// Side of the square arena whose corner is at the origin
    arena_size: f64,
    robot_radius: f64,
}

impl Simulator {
    pub fn new(pose: Pose, axle_length: f64, arena_size: f64, robot_radius: f64) -> Self {
        Self {
            pose: Pose {
                heading: normalize_angle(pose.heading),
                ..pose
            },
            wheels: WheelSpeeds::stop(),
            axle_length,
            arena_size,
            robot_radius,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn set_wheel_speeds(&mut self, wheels: WheelSpeeds) {
        self.wheels = wheels;
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Returns true if a wall blocked the move.
    pub fn step(&mut self, dt: f64) -> bool {
        // v = (v_r + v_l) / 2, ω = (v_r - v_l) / axle
        let linear = (self.wheels.left + self.wheels.right) / 2.0;
        let angular = (self.wheels.right - self.wheels.left) / self.axle_length;
        let theta = self.pose.heading;

        let (new_x, new_y, new_theta) = if angular.abs() < 1e-9 {
            // Straight line motion
            (
                self.pose.x + linear * theta.cos() * dt,
                self.pose.y + linear * theta.sin() * dt,
                theta,
            )
        } else {
            // Arc motion
            let r = linear / angular;
            let new_theta = theta + angular * dt;
            (
                self.pose.x + r * (new_theta.sin() - theta.sin()),
                self.pose.y + r * (theta.cos() - new_theta.cos()),
                new_theta,
            )
        };

        self.pose.heading = normalize_angle(new_theta);

        if self.inside_arena(new_x, new_y) {
            self.pose.x = new_x;
            self.pose.y = new_y;
            false
        } else {
            // Don't update position, only rotation
            debug!("Blocked by arena wall at ({:.2}, {:.2})", new_x, new_y);
            true
        }
    }

    fn inside_arena(&self, x: f64, y: f64) -> bool {
        let lo = self.robot_radius;
        let hi = self.arena_size - self.robot_radius;
        (lo..=hi).contains(&x) && (lo..=hi).contains(&y)
    }
}
