//! Command-line subcommands other than the long-running supervisor.

pub mod check;

pub use check::CheckArgs;
