// Text command parser
//
// Token grammar: [mode prefix][magnitude][direction], e.g. 10F, R90L, D5B
// - direction is the last character: F, B, L or R
// - an R prefix selects rotation (magnitude in degrees), anything else is displacement
// - L/R without the rotation prefix turns 90° first and then drives the magnitude

use super::intent::MotionIntent;

/// Error types for a single command token
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("too short")]
    TooShort,

    #[error("invalid number \"{0}\"")]
    InvalidNumber(String),

    #[error("invalid direction '{0}'")]
    InvalidDirection(char),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Rotation,
    Displacement,
}

/// Parse one command token into a motion intent
pub fn parse(token: &str) -> Result<MotionIntent, ParseError> {
    let token = token.trim().to_uppercase();
    let mut chars: Vec<char> = token.chars().collect();
    if chars.len() < 2 {
        return Err(ParseError::TooShort);
    }

    // len checked above
    let direction = chars.pop().unwrap_or_default();

    let (mode, digits) = match chars.first() {
        Some(&prefix) if prefix.is_alphabetic() => {
            let mode = if prefix == 'R' {
                Mode::Rotation
            } else {
                // D is the explicit form; unknown letters fall back to displacement
                Mode::Displacement
            };
            (mode, &chars[1..])
        }
        _ => (Mode::Displacement, &chars[..]),
    };

    let digits: String = digits.iter().collect();
    let magnitude = parse_magnitude(&digits)?;

    match (mode, direction) {
        (Mode::Rotation, 'L') => Ok(MotionIntent::RotateLeft(magnitude.to_radians())),
        (Mode::Rotation, 'R') => Ok(MotionIntent::RotateRight(magnitude.to_radians())),
        (Mode::Displacement, 'F') => Ok(MotionIntent::Forward(magnitude)),
        (Mode::Displacement, 'B') => Ok(MotionIntent::Backward(magnitude)),
        (Mode::Displacement, 'L') => Ok(MotionIntent::TurnLeftThenMove(magnitude)),
        (Mode::Displacement, 'R') => Ok(MotionIntent::TurnRightThenMove(magnitude)),
        (_, other) => Err(ParseError::InvalidDirection(other)),
    }
}

fn parse_magnitude(digits: &str) -> Result<f64, ParseError> {
    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ParseError::InvalidNumber(digits.to_string())),
    }
}

/// Split a command line on ';' into trimmed, non-empty tokens
pub fn split_sequence(line: &str) -> Vec<&str> {
    line.split(';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}
