//! External diagnostic commands.
//!
//! Commands are run with a fixed argument list, stdout is captured line by
//! line and the exit status is not interpreted. Unlike a bare
//! `Command::output()`, [`SystemCommandRunner`] bounds the run time: a hung
//! command is killed after the configured timeout and whatever it printed so
//! far is returned.

use std::io::{self, BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::DEFAULT_COMMAND_TIMEOUT_MS;

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How long output is still collected once the child is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(50);

/// Runs external commands and returns their stdout lines.
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args`, surfacing spawn failures.
    fn execute(&self, program: &str, args: &[&str]) -> io::Result<Vec<String>>;

    /// Runs a whitespace-separated command line.
    ///
    /// A command that cannot be started yields an empty list.
    fn run_command(&self, command_line: &str) -> Vec<String> {
        let mut parts = command_line.split_whitespace();
        let Some(program) = parts.next() else {
            return Vec::new();
        };
        let args: Vec<&str> = parts.collect();
        match self.execute(program, &args) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(command = %command_line, error = %e, "failed to run command");
                Vec::new()
            }
        }
    }

    /// First stdout line of a command line, or "".
    fn first_answer(&self, command_line: &str) -> String {
        self.run_command(command_line)
            .into_iter()
            .next()
            .unwrap_or_default()
    }
}

/// Spawns real processes.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS))
    }
}

impl CommandRunner for SystemCommandRunner {
    fn execute(&self, program: &str, args: &[&str]) -> io::Result<Vec<String>> {
        debug!(program, ?args, "running command");
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        // own process group, so a timeout also reaches background children
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);
        let mut child = command.spawn()?;

        // Lines are forwarded from a separate thread: a verbose command can
        // fill the pipe buffer, and a descendant that inherited stdout can
        // keep it open long after the child itself is gone.
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("stdout was not captured"))?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || forward_lines(stdout, tx));

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if started.elapsed() >= self.timeout => {
                    warn!(
                        program,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "command timed out, killing it"
                    );
                    kill_tree(&mut child);
                    break;
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    kill_tree(&mut child);
                    return Err(e);
                }
            }
        }

        let deadline = (started + self.timeout).max(Instant::now() + DRAIN_GRACE);
        let mut lines = Vec::new();
        loop {
            match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(line) => lines.push(line),
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    debug!(program, "stdout still open after exit, returning partial output");
                    break;
                }
            }
        }
        Ok(lines)
    }
}

/// Kills the child (and its process group on unix) and reaps it.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: signals only the group created for this child at spawn.
        unsafe {
            libc::killpg(pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Sends stdout to `tx` one entry per line, decoding lossily, until EOF or
/// until the receiver is gone.
fn forward_lines(stdout: ChildStdout, tx: Sender<String>) {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                if tx.send(line.trim_end_matches(['\n', '\r']).to_string()).is_err() {
                    break;
                }
            }
        }
    }
}
