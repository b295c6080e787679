use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Executable name used when no other path is configured.
pub const DEFAULT_TOOL: &str = "ea_tool.exe";
/// Legacy double-byte charset the tool writes its console output in.
pub const DEFAULT_ENCODING: &str = "gbk";

/// One road user as seen by the EA tool.
///
/// Units: `x`/`y` in metres (absolute coordinates), `speed` in m/s,
/// `heading` in radians within [-π, π], `length`/`width` in metres.
/// Values are passed through unchecked; the tool owns validation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadUser {
    pub x: f64,
    pub y: f64,
    #[serde(alias = "v")]
    pub speed: f64,
    #[serde(alias = "h")]
    pub heading: f64,
    #[serde(alias = "l")]
    pub length: f64,
    #[serde(alias = "w")]
    pub width: f64,
}

impl RoadUser {
    pub fn new(x: f64, y: f64, speed: f64, heading: f64, length: f64, width: f64) -> Self {
        Self {
            x,
            y,
            speed,
            heading,
            length,
            width,
        }
    }

    /// Parameters in the order the tool reads them: x, y, v, h, l, w.
    pub fn params(&self) -> [f64; 6] {
        [
            self.x,
            self.y,
            self.speed,
            self.heading,
            self.length,
            self.width,
        ]
    }
}

/// Ego vehicle `a` and the surrounding vehicle `b`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictPair {
    pub a: RoadUser,
    pub b: RoadUser,
}

impl ConflictPair {
    /// The reference scenario: a slow 10 m truck at the origin and a car
    /// approaching from the upper left.
    pub fn example() -> Self {
        Self {
            a: RoadUser::new(0.0, 0.0, 0.1, 0.0, 10.0, 2.5),
            b: RoadUser::new(-2.0, 8.0, 5.0, -1.0, 4.8, 1.8),
        }
    }

    /// Flattens both users into the 12 tool parameters, A first.
    pub fn params(&self) -> [f64; 12] {
        let mut out = [0.0; 12];
        out[..6].copy_from_slice(&self.a.params());
        out[6..].copy_from_slice(&self.b.params());
        out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub program: PathBuf,
    /// `None` waits for the tool indefinitely.
    pub timeout_ms: Option<u64>,
    pub encoding: String,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_TOOL),
            timeout_ms: None,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl SolverConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Partial solver settings; only the fields that are present replace the
/// corresponding [`SolverConfig`] values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverOverrides {
    pub program: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub encoding: Option<String>,
}

impl SolverOverrides {
    pub fn apply_to(self, cfg: &mut SolverConfig) {
        if let Some(program) = self.program {
            cfg.program = program;
        }
        if let Some(ms) = self.timeout_ms {
            cfg.timeout_ms = Some(ms);
        }
        if let Some(encoding) = self.encoding {
            cfg.encoding = encoding;
        }
    }
}
