//! Child process spawning and lifecycle on a PTY slave.

use std::ffi::OsStr;
use std::io;
use std::process::Stdio;

use rustix::process::{Pid, Signal, kill_process};
use tokio::process::{Child, Command};

use crate::config::{PtyConfig, PtySignal};
use crate::error::{PtyError, Result, errno_to_io};
use crate::master::PtyMaster;
use crate::status::ExitStatus;

/// Handle to a process running on the slave side of a PTY.
///
/// The process is killed if the handle is dropped while it is still running;
/// tokio reaps it in the background.
pub struct PtyChild {
    child: Child,
    pid: u32,
    status: Option<ExitStatus>,
}

impl std::fmt::Debug for PtyChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyChild")
            .field("pid", &self.pid)
            .field("status", &self.status)
            .finish()
    }
}

impl PtyChild {
    /// Get the process ID.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// The exit status, if the process has already been reaped.
    #[must_use]
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// Check whether the process is still running without blocking.
    pub fn is_running(&mut self) -> bool {
        matches!(self.try_wait(), Ok(None))
    }

    /// Reap the process if it has exited; never blocks.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if let Some(status) = self.status {
            return Ok(Some(status));
        }
        let status = self.child.try_wait().map_err(PtyError::Wait)?;
        Ok(self.record(status.map(ExitStatus::from)))
    }

    /// Wait for the process to exit.
    ///
    /// Cancel-safe: dropping the future leaves the handle usable.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.status {
            return Ok(status);
        }
        let status = ExitStatus::from(self.child.wait().await.map_err(PtyError::Wait)?);
        self.status = Some(status);
        tracing::debug!(pid = self.pid, %status, "child exited");
        Ok(status)
    }

    /// Send a signal to the process.
    pub fn signal(&mut self, signal: PtySignal) -> Result<()> {
        if self.try_wait()?.is_some() {
            return Err(PtyError::ProcessExited);
        }

        let pid = Pid::from_raw(self.pid as i32).ok_or_else(|| {
            PtyError::Signal(io::Error::new(io::ErrorKind::InvalidInput, "invalid pid"))
        })?;
        let sig = Signal::from_named_raw(signal.as_unix_signal()).ok_or_else(|| {
            PtyError::Signal(io::Error::new(io::ErrorKind::InvalidInput, "invalid signal"))
        })?;

        tracing::debug!(pid = self.pid, ?signal, "signalling child");
        kill_process(pid, sig).map_err(|e| PtyError::Signal(errno_to_io(e)))
    }

    /// Kill the process with SIGKILL.
    pub fn kill(&mut self) -> Result<()> {
        self.signal(PtySignal::Kill)
    }

    fn record(&mut self, status: Option<ExitStatus>) -> Option<ExitStatus> {
        if let Some(status) = status {
            tracing::debug!(pid = self.pid, %status, "child exited");
            self.status = Some(status);
        }
        status
    }
}

/// Spawn `program` with `args` on the slave side of `master`.
///
/// The slave becomes stdin, stdout and stderr of the child. With
/// `config.controlling_terminal` set, the child starts a new session and
/// takes the slave as its controlling terminal, so job control and
/// terminal-generated signals behave as in an interactive login.
pub fn spawn_child<S, I>(
    master: &PtyMaster,
    program: S,
    args: I,
    config: &PtyConfig,
) -> Result<PtyChild>
where
    S: AsRef<OsStr>,
    I: IntoIterator,
    I::Item: AsRef<OsStr>,
{
    let slave = master.open_slave()?;
    let stdio = || slave.try_clone().map(Stdio::from).map_err(PtyError::Spawn);

    let mut cmd = Command::new(program.as_ref());
    cmd.args(args)
        .env_clear()
        .envs(config.effective_env())
        .stdin(stdio()?)
        .stdout(stdio()?)
        .stderr(stdio()?)
        .kill_on_drop(true);

    if let Some(ref dir) = config.working_directory {
        cmd.current_dir(dir);
    }

    if config.controlling_terminal {
        // SAFETY: setsid and ioctl are async-signal-safe; fd 0 is the slave
        // after the stdio redirection above.
        #[allow(unsafe_code)]
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }
                if libc::ioctl(0, libc::TIOCSCTTY, 0) == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    let child = cmd.spawn().map_err(PtyError::Spawn)?;
    let pid = child.id().ok_or_else(|| {
        PtyError::Spawn(io::Error::other("child exited before its pid was read"))
    })?;

    tracing::debug!(pid, program = %program.as_ref().to_string_lossy(), "spawned child on pty");
    Ok(PtyChild {
        child,
        pid,
        status: None,
    })
}
