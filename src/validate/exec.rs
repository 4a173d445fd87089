//! Subprocess execution for build and test commands.
//!
//! The validator forks exactly one child at a time. The child runs under
//! `sh -c` with stderr merged into stdout, placed in its own process group
//! so a timeout can signal the whole tree. The parent polls a non-blocking
//! pipe; on timeout it sends TERM to the group, drains for a grace period,
//! then sends KILL and reaps.

use std::io::Read;
use std::os::fd::AsRawFd;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Outcome of one subprocess run.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Exit code, when the child exited normally.
    pub exit_code: Option<i32>,
    /// Merged stdout/stderr.
    pub output: String,
    /// Whether the run was cut off by the timeout.
    pub timed_out: bool,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

impl ExecResult {
    /// Whether the command completed with exit code zero.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    fn spawn_failure(message: String) -> Self {
        Self {
            exit_code: None,
            output: message,
            timed_out: false,
            duration_ms: 0,
        }
    }
}

/// Runs one shell command at a time with timeout and group-kill semantics.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    /// Pipe poll interval; capped at 200 ms.
    poll_interval: Duration,
    /// How long to drain after TERM before escalating to KILL.
    term_grace: Duration,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            term_grace: Duration::from_secs(5),
        }
    }
}

impl CommandRunner {
    pub fn new(poll_interval: Duration, term_grace: Duration) -> Self {
        Self {
            poll_interval: poll_interval.min(Duration::from_millis(200)),
            term_grace,
        }
    }

    /// Run `command` through the shell in `working_dir`, bounded by
    /// `timeout`.
    pub fn run(&self, command: &str, working_dir: &Path, timeout: Duration) -> ExecResult {
        let start = Instant::now();
        debug!(target: "validate", command, dir = %working_dir.display(), "spawning");

        let mut child = match Command::new("sh")
            .arg("-c")
            .arg(format!("{command} 2>&1"))
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                warn!(target: "validate", command, error = %err, "failed to spawn");
                return ExecResult::spawn_failure(format!("failed to spawn `{command}`: {err}"));
            }
        };

        let mut pipe = child.stdout.take().expect("stdout was piped");
        set_nonblocking(&pipe);

        let mut output = Vec::new();
        loop {
            drain_pipe(&mut pipe, &mut output);

            match child.try_wait() {
                Ok(Some(status)) => {
                    drain_pipe(&mut pipe, &mut output);
                    return ExecResult {
                        exit_code: status.code(),
                        output: String::from_utf8_lossy(&output).into_owned(),
                        timed_out: false,
                        duration_ms: start.elapsed().as_millis() as u64,
                    };
                }
                Ok(None) => {
                    if start.elapsed() >= timeout {
                        return self.terminate(child, pipe, output, command, start);
                    }
                    let remaining = timeout.saturating_sub(start.elapsed());
                    std::thread::sleep(self.poll_interval.min(remaining));
                }
                Err(err) => {
                    warn!(target: "validate", command, error = %err, "wait failed");
                    return ExecResult::spawn_failure(format!("wait failed for `{command}`: {err}"));
                }
            }
        }
    }

    /// TERM the process group, drain for the grace period, then KILL.
    fn terminate(
        &self,
        mut child: Child,
        mut pipe: ChildStdout,
        mut output: Vec<u8>,
        command: &str,
        start: Instant,
    ) -> ExecResult {
        let pgid = child.id() as i32;
        warn!(target: "validate", command, pgid, "timeout, terminating process group");

        // The child is its own group leader, so -pgid reaches the tree.
        unsafe {
            libc::kill(-pgid, libc::SIGTERM);
        }

        let grace_start = Instant::now();
        let mut exited = false;
        while grace_start.elapsed() < self.term_grace {
            drain_pipe(&mut pipe, &mut output);
            if matches!(child.try_wait(), Ok(Some(_))) {
                exited = true;
                break;
            }
            std::thread::sleep(self.poll_interval.min(Duration::from_millis(50)));
        }

        if !exited {
            unsafe {
                libc::kill(-pgid, libc::SIGKILL);
            }
            let _ = child.wait();
        }
        drain_pipe(&mut pipe, &mut output);

        ExecResult {
            exit_code: None,
            output: String::from_utf8_lossy(&output).into_owned(),
            timed_out: true,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Switch the pipe to non-blocking mode so the poll loop never stalls.
fn set_nonblocking(pipe: &ChildStdout) {
    let fd = pipe.as_raw_fd();
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags >= 0 {
            libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
        }
    }
}

/// Read whatever the pipe currently holds, stopping at EOF or WouldBlock.
fn drain_pipe(pipe: &mut ChildStdout, output: &mut Vec<u8>) {
    let mut buf = [0u8; 4096];
    loop {
        match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => output.extend_from_slice(&buf[..n]),
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(_) => break,
        }
    }
}
