//! Session module for driving a program on a pseudo-terminal.
//!
//! A [`Session`] spawns the program with the slave side of a PTY as its
//! terminal, keeps the write half of the master, and hands the read half to a
//! background task that decodes everything into a shared buffer. Expect calls
//! wait on that buffer.
//!
//! # Examples
//!
//! ```ignore
//! use shellprobe::{Session, SessionConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new("/bin/sh").env("PS1", "$ ");
//!     let mut session = Session::spawn_with_config(config)?;
//!
//!     session.expect("$ ").await?;
//!     session.send_line("echo hello").await?;
//!     let m = session.expect("$ ").await?;
//!     assert!(m.before.contains("hello"));
//!
//!     session.send_line("exit").await?;
//!     session.expect_eof(Duration::from_secs(3)).await?;
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

mod handle;
mod reader;

pub use handle::Session;
