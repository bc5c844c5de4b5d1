//! shellprobe-pty: async pseudo-terminals for driving interactive programs.
//!
//! This crate allocates a PTY pair with `rustix`, exposes the master side as
//! a tokio [`AsyncRead`](tokio::io::AsyncRead) + [`AsyncWrite`](tokio::io::AsyncWrite)
//! stream, and spawns a child with the slave as its controlling terminal.
//!
//! # Quick Start
//!
//! ```ignore
//! use shellprobe_pty::{PtyConfig, spawn};
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut master, mut child) = spawn("/bin/sh", ["-i"], &PtyConfig::default())?;
//!
//!     master.write_all(b"echo hello\n").await?;
//!
//!     let mut buf = [0u8; 1024];
//!     let n = master.read(&mut buf).await?;
//!     println!("{}", String::from_utf8_lossy(&buf[..n]));
//!
//!     child.kill()?;
//!     Ok(())
//! }
//! ```
//!
//! Only Unix platforms are supported.

#![cfg(unix)]

mod child;
pub mod config;
pub mod error;
mod master;
mod status;

use std::ffi::OsStr;

pub use child::{PtyChild, spawn_child};
pub use config::{PtyConfig, PtyConfigBuilder, PtySignal, WindowSize};
pub use error::{PtyError, Result};
pub use master::PtyMaster;
pub use status::ExitStatus;

/// Allocate a PTY and spawn `program` on it.
///
/// Must be called from within a tokio runtime.
pub fn spawn<S, I>(program: S, args: I, config: &PtyConfig) -> Result<(PtyMaster, PtyChild)>
where
    S: AsRef<OsStr>,
    I: IntoIterator,
    I::Item: AsRef<OsStr>,
{
    config.validate()?;

    let master = PtyMaster::open()?;
    master.set_window_size(config.window_size)?;
    let child = spawn_child(&master, program, args, config)?;

    Ok((master, child))
}
