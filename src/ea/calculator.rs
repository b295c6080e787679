use encoding_rs::Encoding;
use serde::Serialize;
use tracing::{debug, warn};

use crate::ea::output::{Unavailable, extract_ea_from_bytes};
use crate::error::AppError;
use crate::models::RoadUser;

/// Everything captured from one run of the EA tool.
#[derive(Clone, Debug, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
}

/// Something that can run the EA computation for a prepared argument list.
///
/// The production implementation is [`crate::adapters::ea_tool::ToolSolver`],
/// which spawns the external executable. Tests substitute fakes that return
/// canned output.
pub trait ExternalSolver {
    /// Runs the computation with the 12 positional arguments built by
    /// [`tool_args`].
    ///
    /// # Errors
    /// Only for failures to run the tool at all (launch, I/O, timeout).
    /// Output that lacks a usable value is not an error.
    fn solve(&self, args: &[String]) -> Result<ToolOutput, AppError>;

    /// Charset the solver's stdout is written in.
    fn encoding(&self) -> &'static Encoding {
        encoding_rs::GBK
    }
}

/// Canonical decimal form of a parameter.
///
/// Shortest representation that round-trips, always with a fractional part
/// for integral values (`10.0`, `-2.0`). Magnitudes from 1e16 up or below
/// 1e-4 use a signed, at least two-digit exponent (`1e+16`, `2.5e-05`);
/// non-finite values print as `nan`, `inf` and `-inf`.
pub fn format_param(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let s = format!("{v:?}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s,
    }
}

/// Builds the tool's argument list: A's x, y, v, h, l, w then B's.
pub fn tool_args(a: &RoadUser, b: &RoadUser) -> Vec<String> {
    a.params()
        .into_iter()
        .chain(b.params())
        .map(format_param)
        .collect()
}

/// Outcome of one EA evaluation, including why a value is missing.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EaReport {
    pub ea: Option<f64>,
    /// Human readable reason when `ea` is `None`.
    pub unavailable: Option<String>,
    pub exit_code: Option<i32>,
}

impl EaReport {
    fn from_extraction(extracted: Result<f64, Unavailable>, exit_code: Option<i32>) -> Self {
        match extracted {
            Ok(v) => Self {
                ea: Some(v),
                unavailable: None,
                exit_code,
            },
            Err(reason) => Self {
                ea: None,
                unavailable: Some(reason.to_string()),
                exit_code,
            },
        }
    }
}

/// Runs the solver once and reports the value or the reason it is missing.
///
/// The exit code is recorded but never decides the outcome: a failing tool
/// that still printed an `EA =` line yields its value.
pub fn evaluate<S: ExternalSolver + ?Sized>(
    solver: &S,
    a: &RoadUser,
    b: &RoadUser,
) -> Result<EaReport, AppError> {
    let args = tool_args(a, b);
    let out = solver.solve(&args)?;

    if out.exit_code != Some(0) {
        warn!(exit_code = ?out.exit_code, "EA tool exited unsuccessfully");
    }
    if !out.stderr.is_empty() {
        debug!(stderr = %String::from_utf8_lossy(&out.stderr), "EA tool stderr");
    }

    let extracted = extract_ea_from_bytes(&out.stdout, solver.encoding());
    match &extracted {
        Ok(v) => debug!(ea = %v, "EA value extracted"),
        Err(reason) => warn!(%reason, "EA value unavailable"),
    }

    Ok(EaReport::from_extraction(extracted, out.exit_code))
}

/// Computes EA for road users `a` and `b`.
///
/// Returns `Ok(None)` when the tool ran but its output held no usable
/// `EA =` line; a missing marker and a malformed number are both reported
/// this way.
///
/// # Errors
/// [`AppError::Launch`], [`AppError::Io`] or [`AppError::Timeout`] when the
/// tool itself could not be run to completion.
pub fn calculate_ea<S: ExternalSolver + ?Sized>(
    solver: &S,
    a: &RoadUser,
    b: &RoadUser,
) -> Result<Option<f64>, AppError> {
    evaluate(solver, a, b).map(|report| report.ea)
}
