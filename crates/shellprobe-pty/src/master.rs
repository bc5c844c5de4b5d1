//! The controller side of a pseudo-terminal.
//!
//! [`PtyMaster`] owns the master descriptor in non-blocking mode and drives
//! it through tokio's [`AsyncFd`], so it can be split into independent read
//! and write halves with [`tokio::io::split`].

use std::io;
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use rustix::fs::{Mode, OFlags, fcntl_setfl, open};
use rustix::pty::{OpenptFlags, grantpt, openpt, ptsname, unlockpt};
use rustix::termios::{Winsize, tcgetwinsize, tcsetwinsize};
use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::config::WindowSize;
use crate::error::{PtyError, Result, errno_to_io};

/// The master side of a Unix pseudo-terminal.
pub struct PtyMaster {
    async_fd: AsyncFd<OwnedFd>,
    slave_path: PathBuf,
}

impl std::fmt::Debug for PtyMaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyMaster")
            .field("fd", &self.async_fd.as_raw_fd())
            .field("slave", &self.slave_path)
            .finish()
    }
}

impl PtyMaster {
    /// Allocate a new PTY pair and return the master side.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open() -> Result<Self> {
        let create = |e| PtyError::Create(errno_to_io(e));

        let master_fd = openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY).map_err(create)?;
        grantpt(&master_fd).map_err(create)?;
        unlockpt(&master_fd).map_err(create)?;

        let slave_name = ptsname(&master_fd, Vec::new()).map_err(create)?;
        let slave_path = slave_name
            .to_str()
            .map(PathBuf::from)
            .map_err(|_| {
                PtyError::Create(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "invalid slave path encoding",
                ))
            })?;

        fcntl_setfl(&master_fd, OFlags::NONBLOCK).map_err(create)?;
        let async_fd = AsyncFd::new(master_fd).map_err(PtyError::Create)?;

        tracing::trace!(slave = %slave_path.display(), "allocated pty");
        Ok(Self {
            async_fd,
            slave_path,
        })
    }

    /// Path of the slave device, e.g. `/dev/pts/3`.
    #[must_use]
    pub fn slave_path(&self) -> &Path {
        &self.slave_path
    }

    /// Open the slave side for a child process.
    ///
    /// The descriptor is close-on-exec; the spawner duplicates it onto the
    /// child's standard streams.
    pub fn open_slave(&self) -> Result<OwnedFd> {
        open(
            &self.slave_path,
            OFlags::RDWR | OFlags::NOCTTY | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(|e| PtyError::Create(errno_to_io(e)))
    }

    /// Set the window size.
    pub fn set_window_size(&self, size: WindowSize) -> Result<()> {
        size.validate()?;
        let winsize = Winsize {
            ws_col: size.cols,
            ws_row: size.rows,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        tcsetwinsize(self.async_fd.get_ref(), winsize).map_err(|e| PtyError::Resize(errno_to_io(e)))
    }

    /// Get the current window size.
    pub fn window_size(&self) -> Result<WindowSize> {
        let winsize = tcgetwinsize(self.async_fd.get_ref())?;
        Ok(WindowSize::new(winsize.ws_col, winsize.ws_row))
    }
}

impl AsRawFd for PtyMaster {
    fn as_raw_fd(&self) -> RawFd {
        self.async_fd.as_raw_fd()
    }
}

impl AsyncRead for PtyMaster {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        loop {
            let mut guard = match self.async_fd.poll_read_ready(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            };

            let unfilled = buf.initialize_unfilled();
            match rustix::io::read(self.async_fd.get_ref(), unfilled) {
                Ok(n) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Err(rustix::io::Errno::AGAIN) => {
                    guard.clear_ready();
                }
                // Linux reports a hung-up slave as EIO rather than a 0-byte read.
                Err(rustix::io::Errno::IO) => return Poll::Ready(Ok(())),
                Err(e) => return Poll::Ready(Err(errno_to_io(e))),
            }
        }
    }
}

impl AsyncWrite for PtyMaster {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        loop {
            let mut guard = match self.async_fd.poll_write_ready(cx) {
                Poll::Ready(Ok(guard)) => guard,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            };

            match rustix::io::write(self.async_fd.get_ref(), buf) {
                Ok(n) => return Poll::Ready(Ok(n)),
                Err(rustix::io::Errno::AGAIN) => {
                    guard.clear_ready();
                }
                Err(e) => return Poll::Ready(Err(errno_to_io(e))),
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn open_pty() {
        let master = PtyMaster::open().unwrap();
        let path = master.slave_path().to_string_lossy().into_owned();
        assert!(path.starts_with("/dev/pts/") || path.starts_with("/dev/pty"));
    }

    #[tokio::test]
    async fn window_size_operations() {
        let master = PtyMaster::open().unwrap();

        master.set_window_size(WindowSize::new(120, 40)).unwrap();
        let retrieved = master.window_size().unwrap();
        assert_eq!(retrieved, WindowSize::new(120, 40));

        assert!(master.set_window_size(WindowSize::new(0, 0)).is_err());
    }

    #[tokio::test]
    async fn slave_output_reaches_master() {
        let mut master = PtyMaster::open().unwrap();
        let slave = master.open_slave().unwrap();

        rustix::io::write(&slave, b"ping").unwrap();

        let mut buf = [0u8; 16];
        let n = master.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");

        master.write_all(b"x").await.unwrap();
    }

    #[tokio::test]
    async fn closed_slave_reads_as_eof() {
        let mut master = PtyMaster::open().unwrap();
        let slave = master.open_slave().unwrap();
        drop(slave);

        let mut buf = [0u8; 16];
        let n = master.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }
}
