//! Shared error taxonomy, platform detection, configuration, cancellation
//! and logging bootstrap used by every other `anvil-*` crate.

pub mod cancel;
pub mod config;
pub mod error;
pub mod platform;
pub mod tracing_setup;

pub use cancel::CancellationToken;
pub use config::{AnvilConfig, ConfigManager};
pub use error::{AnvilError, Categorized, ErrorCategory, Result};
pub use platform::{Arch, Libc, Os, Platform};
pub use tracing_setup::init_tracing;
