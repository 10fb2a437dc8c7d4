mod commands;
mod executor;

pub use commands::{BreakpointAction, Cli, Command, CommandError, CommandResult, SetTarget};
pub use executor::Executor;
