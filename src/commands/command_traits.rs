//! Command pattern interfaces
//!
//! Every subcommand is a `Command` built by a `CommandFactory` from the
//! parsed CLI arguments.

use crate::errors::PatchResult;
use crate::utils::logger::Logger;

/// Represents an executable command in the application
pub trait Command {
    fn execute(&self) -> PatchResult<()>;
}

/// Factory for creating commands from CLI arguments
pub trait CommandFactory<'a> {
    /// Create the command selected by `args`
    ///
    /// `logger` receives one summary line per run.
    fn create_command(&self, args: &clap::ArgMatches, logger: &'a Logger) -> PatchResult<Box<dyn Command + 'a>>;
}
