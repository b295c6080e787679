use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::ea::calculator::{EaReport, format_param};
use crate::error::AppError;
use crate::models::{ConflictPair, RoadUser, SolverConfig, SolverOverrides};

const UNAVAILABLE_MESSAGE: &str =
    "Failed to compute EA value. Please check the input or ea_tool output.";

#[derive(Parser, Debug)]
#[command(author, version, about = "Evasive Acceleration (EA) for a pair of road users via ea_tool", long_about = None)]
pub struct Args {
    #[arg(long)]
    json: bool,
    #[arg(
        long,
        value_name = "FILE",
        help = "JSON file with road users 'a', 'b' and optional 'solver'; '-' reads from stdin"
    )]
    input: Option<String>,
    #[arg(
        long,
        value_name = "JSON",
        help = "Inline JSON with road users 'a' and 'b' (overrides --input)"
    )]
    pair_json: Option<String>,
    #[arg(long, help = "Run the built-in reference scenario")]
    example: bool,
    #[arg(long, value_name = "FILE", help = "JSON solver configuration")]
    config: Option<String>,
    #[arg(long, value_name = "PATH", help = "Path to the EA executable")]
    tool: Option<PathBuf>,
    #[arg(long, value_name = "MS", help = "Kill the tool after this many milliseconds")]
    timeout_ms: Option<u64>,
    #[arg(long, value_name = "LABEL", help = "Charset of the tool's output (default gbk)")]
    encoding: Option<String>,
    #[arg(
        value_name = "VALUE",
        num_args = 12,
        allow_negative_numbers = true,
        help = "xA yA vA hA lA wA xB yB vB hB lB wB"
    )]
    values: Vec<f64>,
}

#[derive(serde::Deserialize)]
struct CmdInput {
    a: RoadUser,
    b: RoadUser,
    #[serde(default)]
    solver: Option<SolverConfig>,
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the `warn` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn pair_from_values(v: &[f64]) -> ConflictPair {
    ConflictPair {
        a: RoadUser::new(v[0], v[1], v[2], v[3], v[4], v[5]),
        b: RoadUser::new(v[6], v[7], v[8], v[9], v[10], v[11]),
    }
}

fn parse_cmd_input_doc(doc: &str) -> Result<(ConflictPair, Option<SolverConfig>), AppError> {
    let parsed: CmdInput =
        serde_json::from_str(doc).map_err(|source| AppError::ParseInputJson { source })?;
    Ok((
        ConflictPair {
            a: parsed.a,
            b: parsed.b,
        },
        parsed.solver,
    ))
}

/// Picks the road-user pair from, in order: `--pair-json`, `--input`,
/// positional values, `--example`. A solver section is only read from an
/// input document.
pub fn parse_inputs(args: &Args) -> Result<(ConflictPair, Option<SolverConfig>), AppError> {
    match (&args.pair_json, &args.input) {
        (Some(json), _) => {
            let pair: ConflictPair =
                serde_json::from_str(json).map_err(|source| AppError::ParsePairJson { source })?;
            Ok((pair, None))
        }
        (None, Some(path)) if path == "-" => {
            let mut s = String::new();
            io::stdin()
                .read_to_string(&mut s)
                .map_err(|source| AppError::ReadStdin { source })?;
            parse_cmd_input_doc(&s)
        }
        (None, Some(path)) => {
            let s = fs::read_to_string(path).map_err(|source| AppError::ReadFile {
                path: path.clone(),
                source,
            })?;
            parse_cmd_input_doc(&s)
        }
        (None, None) if args.values.len() == 12 => Ok((pair_from_values(&args.values), None)),
        (None, None) if args.example => Ok((ConflictPair::example(), None)),
        (None, None) => Err(AppError::MissingInputData),
    }
}

/// Layers solver settings: defaults, then the input document's `solver`
/// section, then `--config`, then individual flags. Each layer replaces only
/// the fields it sets.
pub fn resolve_config(
    args: &Args,
    doc_solver: Option<SolverConfig>,
) -> Result<SolverConfig, AppError> {
    let mut cfg = doc_solver.unwrap_or_default();

    if let Some(path) = &args.config {
        let s = fs::read_to_string(path).map_err(|source| AppError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let file: SolverOverrides =
            serde_json::from_str(&s).map_err(|source| AppError::ParseConfigJson {
                path: path.clone(),
                source,
            })?;
        file.apply_to(&mut cfg);
    }

    SolverOverrides {
        program: args.tool.clone(),
        timeout_ms: args.timeout_ms,
        encoding: args.encoding.clone(),
    }
    .apply_to(&mut cfg);

    Ok(cfg)
}

pub fn print_output(out: &EaReport, args: &Args) -> Result<(), AppError> {
    if args.json {
        let s = serde_json::to_string_pretty(out)
            .map_err(|source| AppError::SerializeOutput { source })?;
        println!("{}", s);
    } else {
        match out.ea {
            Some(v) => println!("EA = {}", format_param(v)),
            None => println!("{UNAVAILABLE_MESSAGE}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("ea_rs").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn positional_values_keep_order_and_sign() {
        let a = args(&[
            "0", "0", "0.1", "0", "10", "2.5", "-2", "8", "5", "-1", "4.8", "1.8",
        ]);
        let (pair, solver) = parse_inputs(&a).unwrap();
        assert_eq!(pair, ConflictPair::example());
        assert!(solver.is_none());
    }

    #[test]
    fn wrong_number_of_values_is_rejected() {
        let res = Args::try_parse_from(["ea_rs", "1", "2", "3"]);
        assert!(res.is_err());
    }

    #[test]
    fn pair_json_accepts_short_field_names() {
        let a = args(&[
            "--pair-json",
            r#"{"a":{"x":0,"y":0,"v":0.1,"h":0,"l":10,"w":2.5},
                "b":{"x":-2,"y":8,"speed":5,"heading":-1,"length":4.8,"width":1.8}}"#,
        ]);
        let (pair, _) = parse_inputs(&a).unwrap();
        assert_eq!(pair, ConflictPair::example());
    }

    #[test]
    fn flags_override_document_solver() {
        let a = args(&["--example", "--tool", "/usr/local/bin/ea", "--timeout-ms", "250"]);
        let doc = SolverConfig {
            program: PathBuf::from("from-doc"),
            timeout_ms: None,
            encoding: "gb18030".into(),
        };
        let cfg = resolve_config(&a, Some(doc)).unwrap();
        assert_eq!(cfg.program, PathBuf::from("/usr/local/bin/ea"));
        assert_eq!(cfg.timeout_ms, Some(250));
        assert_eq!(cfg.encoding, "gb18030");
    }

    #[test]
    fn nothing_given_is_missing_input() {
        let a = args(&[]);
        assert!(matches!(parse_inputs(&a), Err(AppError::MissingInputData)));
    }

    #[test]
    fn config_file_keeps_document_fields_it_does_not_set() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("solver.json");
        std::fs::write(&path, r#"{"timeout_ms":500}"#).unwrap();

        let a = args(&["--example", "--config", path.to_str().unwrap()]);
        let doc = SolverConfig {
            program: PathBuf::from("/opt/doc_tool"),
            timeout_ms: None,
            encoding: "gb18030".into(),
        };
        let cfg = resolve_config(&a, Some(doc)).unwrap();
        assert_eq!(cfg.program, PathBuf::from("/opt/doc_tool"));
        assert_eq!(cfg.timeout_ms, Some(500));
        assert_eq!(cfg.encoding, "gb18030");
    }

    #[test]
    fn flags_win_over_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("solver.json");
        std::fs::write(&path, r#"{"program":"/from/file","encoding":"big5"}"#).unwrap();

        let a = args(&[
            "--example",
            "--config",
            path.to_str().unwrap(),
            "--tool",
            "/from/flag",
        ]);
        let cfg = resolve_config(&a, None).unwrap();
        assert_eq!(cfg.program, PathBuf::from("/from/flag"));
        assert_eq!(cfg.encoding, "big5");
        assert_eq!(cfg.timeout_ms, None);
    }
}
