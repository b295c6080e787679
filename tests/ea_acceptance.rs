use std::cell::RefCell;

use ea_rs::{AppError, ConflictPair, ExternalSolver, RoadUser, ToolOutput, calculate_ea, evaluate};

/// Returns canned stdout and remembers the arguments it was called with.
struct FakeSolver {
    stdout: Vec<u8>,
    exit_code: Option<i32>,
    seen: RefCell<Vec<Vec<String>>>,
}

impl FakeSolver {
    fn printing(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl ExternalSolver for FakeSolver {
    fn solve(&self, args: &[String]) -> Result<ToolOutput, AppError> {
        self.seen.borrow_mut().push(args.to_vec());
        Ok(ToolOutput {
            stdout: self.stdout.clone(),
            stderr: b"diagnostics go here".to_vec(),
            exit_code: self.exit_code,
        })
    }
}

struct UnlaunchableSolver;

impl ExternalSolver for UnlaunchableSolver {
    fn solve(&self, _args: &[String]) -> Result<ToolOutput, AppError> {
        Err(AppError::Launch {
            program: "ea_tool.exe".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }
}

fn reference() -> (RoadUser, RoadUser) {
    let p = ConflictPair::example();
    (p.a, p.b)
}

#[test]
fn returns_value_following_marker() {
    let (a, b) = reference();
    let solver = FakeSolver::printing("EA = 3.14 anything\n");
    assert_eq!(calculate_ea(&solver, &a, &b).unwrap(), Some(3.14));
}

#[test]
fn passes_the_twelve_parameters_in_order() {
    let (a, b) = reference();
    let solver = FakeSolver::printing("EA = 0.0\n");
    calculate_ea(&solver, &a, &b).unwrap();

    let seen = solver.seen.borrow();
    assert_eq!(seen.len(), 1, "exactly one tool run per call");
    assert_eq!(
        seen[0],
        [
            "0.0", "0.0", "0.1", "0.0", "10.0", "2.5", "-2.0", "8.0", "5.0", "-1.0", "4.8", "1.8"
        ]
    );
}

#[test]
fn output_without_marker_is_unavailable() {
    let (a, b) = reference();
    let solver = FakeSolver::printing("Input accepted.\nTTC = 1.2\n");
    assert_eq!(calculate_ea(&solver, &a, &b).unwrap(), None);
}

#[test]
fn non_numeric_value_is_unavailable() {
    let (a, b) = reference();
    let solver = FakeSolver::printing("EA = notanumber\n");
    assert_eq!(calculate_ea(&solver, &a, &b).unwrap(), None);

    let report = evaluate(&solver, &a, &b).unwrap();
    assert_eq!(
        report.unavailable.as_deref(),
        Some("malformed EA value 'notanumber'")
    );
}

#[test]
fn first_marker_line_wins() {
    let (a, b) = reference();
    let solver = FakeSolver::printing("EA = 1.75\nEA = 8.0\n");
    assert_eq!(calculate_ea(&solver, &a, &b).unwrap(), Some(1.75));
}

#[test]
fn invalid_legacy_bytes_do_not_fail() {
    let (a, b) = reference();
    let mut stdout = vec![0xFE, 0x20, 0x80, 0xFF, b'\r', b'\n'];
    stdout.extend_from_slice(b"EA = -4.5 m/s2\r\n");
    let solver = FakeSolver::printing(stdout);
    assert_eq!(calculate_ea(&solver, &a, &b).unwrap(), Some(-4.5));
}

#[test]
fn failing_exit_code_does_not_hide_value() {
    let (a, b) = reference();
    let mut solver = FakeSolver::printing("warning: heading clipped\nEA = 0.42\n");
    solver.exit_code = Some(2);

    let report = evaluate(&solver, &a, &b).unwrap();
    assert_eq!(report.ea, Some(0.42));
    assert_eq!(report.exit_code, Some(2));
}

#[test]
fn launch_failure_propagates() {
    let (a, b) = reference();
    let err = calculate_ea(&UnlaunchableSolver, &a, &b).unwrap_err();
    assert!(matches!(err, AppError::Launch { .. }));
    assert!(err.to_string().starts_with("Could not launch 'ea_tool.exe'"));
}

#[test]
fn works_through_a_trait_object() {
    let (a, b) = reference();
    let solver: Box<dyn ExternalSolver> = Box::new(FakeSolver::printing("EA = 7.0"));
    assert_eq!(calculate_ea(solver.as_ref(), &a, &b).unwrap(), Some(7.0));
}
