// Message types exchanged with the pose feed, the actuator and the session peer

use std::fmt;

use serde::{Deserialize, Serialize};

// Pose feed -> runtime, once per tick
// heading is in radians and is not normalized by the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// Euclidean distance between the two positions (heading ignored)
    pub fn distance_to(&self, other: &Pose) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    PoseStale,
}

/// One outbound line of the session text protocol
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok(String),
    Error(String),
    Info(String),
    Status(String),
    Hello(String),
    Commands(String),
}

impl Response {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ok(_) => "OK",
            Self::Error(_) => "ERROR",
            Self::Info(_) => "INFO",
            Self::Status(_) => "STATUS",
            Self::Hello(_) => "HELLO",
            Self::Commands(_) => "COMMANDS",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Ok(s)
            | Self::Error(s)
            | Self::Info(s)
            | Self::Status(s)
            | Self::Hello(s)
            | Self::Commands(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

// Rendered without the trailing newline; the session writer adds it
impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.prefix(), self.text())
    }
}
