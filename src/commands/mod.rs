//! CLI command implementations

pub mod command_traits;
pub mod annotate_command;
pub mod extract_command;
pub mod organize_command;
pub mod info_command;

pub use command_traits::{Command, CommandFactory};
pub use annotate_command::AnnotateCommand;
pub use extract_command::ExtractCommand;
pub use organize_command::OrganizeCommand;
pub use info_command::InfoCommand;

use clap::ArgMatches;
use crate::api::VoxPatch;
use crate::errors::{PatchError, PatchResult};
use crate::utils::logger::Logger;

/// Picks the command for the subcommand on the command line
pub struct VoxpatchCommandFactory<'a> {
    api: &'a VoxPatch,
}

impl<'a> VoxpatchCommandFactory<'a> {
    pub fn new(api: &'a VoxPatch) -> Self {
        VoxpatchCommandFactory { api }
    }
}

impl<'a> CommandFactory<'a> for VoxpatchCommandFactory<'a> {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> PatchResult<Box<dyn Command + 'a>> {
        match args.subcommand() {
            Some(("annotate", sub)) => Ok(Box::new(AnnotateCommand::new(sub, self.api, logger)?)),
            Some(("extract", sub)) => Ok(Box::new(ExtractCommand::new(sub, self.api, logger)?)),
            Some(("organize", sub)) => Ok(Box::new(OrganizeCommand::new(sub, self.api, logger)?)),
            Some(("info", sub)) => Ok(Box::new(InfoCommand::new(sub, self.api, logger)?)),
            Some((other, _)) => Err(PatchError::InvalidInput(format!("Unknown command '{}'", other))),
            None => Err(PatchError::InvalidInput("No command given".to_string())),
        }
    }
}
