//! Convenient re-exports for common shellprobe usage.
//!
//! ```ignore
//! use shellprobe::prelude::*;
//! ```

pub use crate::config::{LineEnding, SessionConfig, TimeoutConfig};
pub use crate::error::{ExpectError, Result, SpawnError};
pub use crate::expect::{Pattern, PatternSet};
pub use crate::report::Report;
pub use crate::scenario::{Runner, Scenario, Step, Verdict};
pub use crate::session::Session;
pub use crate::types::{ControlChar, ExitStatus, Match};
