//! shellprobe: behavioral tests for interactive shells over a pseudo-terminal
//!
//! This crate drives a line-oriented program the way a person at a terminal
//! would: it spawns the program on a PTY, types lines and control keys, and
//! waits for the output to match expected patterns within a time limit.
//!
//! # Features
//!
//! - **Async-first design** with Tokio runtime
//! - **Streaming output capture** with lossy UTF-8 decoding
//! - **Pattern matching** with regex, literal and end-of-stream patterns
//! - **Scenarios** of send / await / assert steps with per-step verdicts
//! - **Built-in shell suite** covering builtins, redirection and completion
//!
//! # Example
//!
//! ```ignore
//! use shellprobe::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut session = Session::spawn_with_config(
//!         SessionConfig::new("/bin/sh").env("PS1", "$ "),
//!     )?;
//!     session.expect("$ ").await?;
//!     session.send_line("echo hello").await?;
//!     session.expect("hello").await?;
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

#![cfg(unix)]

pub mod config;
pub mod encoding;
pub mod error;
pub mod expect;
pub mod prelude;
pub mod report;
pub mod scenario;
pub mod session;
pub mod types;

pub use config::{BufferConfig, EnvConfig, LineEnding, ProbeConfig, SessionConfig, TimeoutConfig};
pub use error::{ExpectError, Result, SpawnError};
pub use expect::{Pattern, PatternSet};
pub use report::Report;
pub use scenario::{Check, Failure, Fixtures, Input, RunState, Runner, Scenario, Step, Verdict, shell_suite};
pub use session::Session;
pub use types::{ControlChar, ExitStatus, Match, SessionState};
