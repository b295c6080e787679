//! Process-backed [`ExternalSolver`]: runs the EA executable once per call.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use encoding_rs::Encoding;
use tracing::{debug, info, warn};

use crate::ea::calculator::{ExternalSolver, ToolOutput};
use crate::ea::output::encoding_for_label;
use crate::error::AppError;
use crate::models::{DEFAULT_TOOL, SolverConfig};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Spawns the EA tool with the prepared arguments and captures its output.
///
/// Each call starts an independent child process, so one solver can be
/// shared between threads. Without a timeout the call blocks until the tool
/// exits; with one, an overrunning tool is killed and reported as
/// [`AppError::Timeout`].
#[derive(Clone, Debug)]
pub struct ToolSolver {
    program: PathBuf,
    timeout: Option<Duration>,
    encoding: &'static Encoding,
}

impl Default for ToolSolver {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}

impl ToolSolver {
    /// Solver for `program`, resolved through the OS search path when it is
    /// a bare name. Output is decoded as GBK and the wait is unbounded.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
            encoding: encoding_rs::GBK,
        }
    }

    pub fn from_config(cfg: &SolverConfig) -> Result<Self, AppError> {
        Ok(Self {
            program: cfg.program.clone(),
            timeout: cfg.timeout(),
            encoding: encoding_for_label(&cfg.encoding)?,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn io_error(&self, source: io::Error) -> AppError {
        AppError::Io {
            program: self.program.clone(),
            source,
        }
    }

    fn timed_out(&self, child: &mut Child, limit: Duration) -> AppError {
        warn!(
            program = %self.program.display(),
            timeout_ms = limit.as_millis(),
            "EA tool timed out, killing it"
        );
        if let Err(e) = child.kill() {
            debug!(error = %e, "kill after timeout failed");
        }
        let _ = child.wait();
        AppError::Timeout {
            program: self.program.clone(),
            after: limit,
        }
    }

    fn run(&self, args: &[String]) -> Result<ToolOutput, AppError> {
        info!(
            program = %self.program.display(),
            args = ?args,
            timeout_ms = ?self.timeout.map(|t| t.as_millis()),
            "Running EA tool"
        );

        // One deadline covers both the exit and draining the pipes.
        let deadline = self.timeout.map(|limit| (Instant::now() + limit, limit));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AppError::Launch {
                program: self.program.clone(),
                source,
            })?;

        let (tx, rx) = mpsc::channel();
        drain(Pipe::Stdout, child.stdout.take(), tx.clone());
        drain(Pipe::Stderr, child.stderr.take(), tx);

        let status = match deadline {
            None => child.wait().map_err(|e| self.io_error(e))?,
            Some((at, limit)) => match wait_until(&mut child, at).map_err(|e| self.io_error(e))? {
                Some(status) => status,
                None => return Err(self.timed_out(&mut child, limit)),
            },
        };

        // Reader threads outliving a timeout are detached; a grandchild may
        // still hold the pipes open.
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        for _ in 0..2 {
            let received = match deadline {
                None => rx.recv().map_err(|_| io::Error::other("output reader vanished")),
                Some((at, limit)) => {
                    match rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                        Ok(msg) => Ok(msg),
                        Err(RecvTimeoutError::Timeout) => {
                            return Err(self.timed_out(&mut child, limit));
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            Err(io::Error::other("output reader vanished"))
                        }
                    }
                }
            };
            let (pipe, bytes) = received.map_err(|e| self.io_error(e))?;
            let bytes = bytes.map_err(|e| self.io_error(e))?;
            match pipe {
                Pipe::Stdout => stdout = bytes,
                Pipe::Stderr => stderr = bytes,
            }
        }

        debug!(
            exit_code = ?status.code(),
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "EA tool finished"
        );

        Ok(ToolOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

impl ExternalSolver for ToolSolver {
    fn solve(&self, args: &[String]) -> Result<ToolOutput, AppError> {
        self.run(args)
    }

    fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

#[derive(Clone, Copy, Debug)]
enum Pipe {
    Stdout,
    Stderr,
}

type Drained = (Pipe, io::Result<Vec<u8>>);

fn drain<R: Read + Send + 'static>(which: Pipe, pipe: Option<R>, tx: Sender<Drained>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let res = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buf).map(|_| buf),
            None => Ok(buf),
        };
        // The receiver is gone once the caller has timed out.
        let _ = tx.send((which, res));
    });
}

/// Polls `child` until it exits or `deadline` passes; `None` means timed out.
fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}
