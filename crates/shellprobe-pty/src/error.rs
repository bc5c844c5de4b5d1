//! Error types for the shellprobe-pty crate.
//!
//! Every fallible PTY operation returns [`PtyError`]. The variants follow
//! the stage that failed so callers can tell allocation problems apart from
//! a program that could not be executed.

use std::io;

/// The error type for PTY operations.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    /// Failed to allocate or configure the master/slave pair.
    #[error("failed to create PTY: {0}")]
    Create(#[source] io::Error),

    /// Failed to spawn the child process.
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] io::Error),

    /// An I/O error occurred on the master side.
    #[error("PTY I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to resize the PTY.
    #[error("failed to resize PTY: {0}")]
    Resize(#[source] io::Error),

    /// The PTY has been closed.
    #[error("PTY has been closed")]
    Closed,

    /// The child has already been reaped.
    #[error("child process has already exited")]
    ProcessExited,

    /// Failed to send a signal to the child process.
    #[error("failed to send signal: {0}")]
    Signal(#[source] io::Error),

    /// Failed to wait for the child process.
    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),

    /// Invalid window size specified.
    #[error("invalid window size: {cols}x{rows}")]
    InvalidWindowSize {
        /// The requested number of columns.
        cols: u16,
        /// The requested number of rows.
        rows: u16,
    },
}

/// A specialized Result type for PTY operations.
pub type Result<T> = std::result::Result<T, PtyError>;

impl PtyError {
    /// The OS error kind behind this error, when there is one.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Create(e)
            | Self::Spawn(e)
            | Self::Io(e)
            | Self::Resize(e)
            | Self::Signal(e)
            | Self::Wait(e) => Some(e.kind()),
            _ => None,
        }
    }
}

pub(crate) fn errno_to_io(errno: rustix::io::Errno) -> io::Error {
    io::Error::from_raw_os_error(errno.raw_os_error())
}

impl From<rustix::io::Errno> for PtyError {
    fn from(errno: rustix::io::Errno) -> Self {
        Self::Io(errno_to_io(errno))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PtyError::Closed;
        assert_eq!(err.to_string(), "PTY has been closed");

        let err = PtyError::InvalidWindowSize { cols: 0, rows: 24 };
        assert_eq!(err.to_string(), "invalid window size: 0x24");
    }

    #[test]
    fn error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let pty_err: PtyError = io_err.into();
        assert!(matches!(pty_err, PtyError::Io(_)));
        assert_eq!(pty_err.io_kind(), Some(io::ErrorKind::NotFound));
    }

    #[test]
    fn spawn_error_keeps_kind() {
        let err = PtyError::Spawn(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
        assert_eq!(PtyError::Closed.io_kind(), None);
    }

    #[test]
    fn error_from_errno() {
        let err: PtyError = rustix::io::Errno::IO.into();
        assert!(matches!(err, PtyError::Io(_)));
    }
}
