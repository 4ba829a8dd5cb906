//! Plan execution (C9): carries out an `InstallationPlan`'s steps against
//! an ephemeral staging root, verifying checksums and guarding against
//! path escapes along the way.

pub mod archive;
pub mod error;
pub mod executor;
pub mod path_guard;

pub use error::{ExecError, Result};
pub use executor::{ExecutionReport, Executor};
