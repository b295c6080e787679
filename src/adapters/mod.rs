#[cfg(feature = "cli")]
pub mod cli;
pub mod ea_tool;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
pub fn run() -> Result<(), crate::error::AppError> {
    use crate::adapters::cli::{Args, init_logging, parse_inputs, resolve_config};
    use crate::adapters::ea_tool::ToolSolver;
    use crate::ea::calculator::evaluate;

    init_logging();

    let args = Args::parse();
    let (pair, doc_solver) = parse_inputs(&args)?;
    let cfg = resolve_config(&args, doc_solver)?;
    let solver = ToolSolver::from_config(&cfg)?;

    let report = evaluate(&solver, &pair.a, &pair.b)?;

    crate::adapters::cli::print_output(&report, &args)?;

    Ok(())
}
