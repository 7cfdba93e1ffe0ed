//! Per-volume folder layout command

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::api::VoxPatch;
use crate::commands::command_traits::Command;
use crate::errors::{PatchError, PatchResult};
use crate::utils::logger::Logger;

/// Copies every `Cube_<id>_crop.tif` of a folder into its own volume
/// directory next to that folder
pub struct OrganizeCommand<'a> {
    source_dir: PathBuf,
    api: &'a VoxPatch,
    logger: &'a Logger,
}

impl<'a> OrganizeCommand<'a> {
    pub fn new(args: &ArgMatches, api: &'a VoxPatch, logger: &'a Logger) -> PatchResult<Self> {
        let source_dir = args.get_one::<PathBuf>("source")
            .ok_or_else(|| PatchError::InvalidInput("Missing source directory".to_string()))?
            .clone();

        Ok(OrganizeCommand { source_dir, api, logger })
    }
}

impl<'a> Command for OrganizeCommand<'a> {
    fn execute(&self) -> PatchResult<()> {
        let report = self.api.organize(&self.source_dir)?;

        for path in &report.copied {
            println!("Copied {}", path.display());
        }
        for (path, reason) in &report.failed {
            println!("Failed {}: {}", path.display(), reason);
        }

        let summary = format!("organize {}: {} copied, {} already in place, {} failed",
                              self.source_dir.display(), report.copied.len(),
                              report.unchanged.len(), report.failed.len());
        info!("{}", summary);
        println!("{}", summary);
        self.logger.log(&summary)?;
        Ok(())
    }
}
