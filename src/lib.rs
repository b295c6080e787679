pub mod adapters;
pub mod ea;
pub mod error;
pub mod models;

pub use crate::adapters::ea_tool::ToolSolver;
pub use crate::ea::calculator::{
    EaReport, ExternalSolver, ToolOutput, calculate_ea, evaluate, format_param, tool_args,
};
pub use crate::ea::output::{EA_MARKER, Unavailable, extract_ea};
pub use crate::error::AppError;
pub use crate::models::{ConflictPair, RoadUser, SolverConfig, SolverOverrides};
