//! Volume file summary command

use std::path::PathBuf;

use clap::ArgMatches;

use crate::api::VoxPatch;
use crate::commands::command_traits::Command;
use crate::errors::{PatchError, PatchResult};
use crate::utils::logger::Logger;

/// Prints page count, slice size, sample type and compression of a file
pub struct InfoCommand<'a> {
    input_file: PathBuf,
    api: &'a VoxPatch,
    logger: &'a Logger,
}

impl<'a> InfoCommand<'a> {
    pub fn new(args: &ArgMatches, api: &'a VoxPatch, logger: &'a Logger) -> PatchResult<Self> {
        let input_file = args.get_one::<PathBuf>("input")
            .ok_or_else(|| PatchError::InvalidInput("Missing input file".to_string()))?
            .clone();

        Ok(InfoCommand { input_file, api, logger })
    }
}

impl<'a> Command for InfoCommand<'a> {
    fn execute(&self) -> PatchResult<()> {
        let summary = self.api.analyze(&self.input_file)?;
        print!("{}", summary);
        self.logger.log(&format!("info {}", self.input_file.display()))?;
        Ok(())
    }
}
