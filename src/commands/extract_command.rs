//! Batch patch extraction command

use std::path::PathBuf;

use clap::ArgMatches;

use crate::api::VoxPatch;
use crate::batch::VolumeOutcome;
use crate::commands::command_traits::Command;
use crate::errors::{PatchError, PatchResult};
use crate::extractor::ExtractionPolicy;
use crate::utils::logger::Logger;

/// Extracts patches for every volume directory under a root
pub struct ExtractCommand<'a> {
    root: PathBuf,
    /// Configured API with the command-line overrides applied
    api: VoxPatch,
    logger: &'a Logger,
}

impl<'a> ExtractCommand<'a> {
    pub fn new(args: &ArgMatches, base: &VoxPatch, logger: &'a Logger) -> PatchResult<Self> {
        let root = args.get_one::<PathBuf>("root")
            .ok_or_else(|| PatchError::InvalidInput("Missing root directory".to_string()))?
            .clone();

        let mut config = base.config().clone();
        if let Some(policy) = args.get_one::<String>("policy") {
            config.extraction.policy = policy.parse::<ExtractionPolicy>()?;
        }
        if let Some(size) = args.get_one::<usize>("patch-size") {
            config.extraction.patch_size = *size;
        }
        if let Some(name) = args.get_one::<String>("compression") {
            config.output_compression = name.clone();
        }
        if args.get_flag("no-progress") {
            config.logging.progress = false;
        }
        config.validate()?;

        Ok(ExtractCommand { root, api: VoxPatch::new(config), logger })
    }
}

impl<'a> Command for ExtractCommand<'a> {
    fn execute(&self) -> PatchResult<()> {
        let report = self.api.run_batch(&self.root)?;

        for outcome in &report.outcomes {
            println!("{}", outcome);
            if let VolumeOutcome::Processed(volume) = outcome {
                self.logger.log(&format!("{}: saved {} patches to {}, {} out of bounds",
                                         volume.volume_id, volume.saved,
                                         volume.patch_dir.display(), volume.out_of_bounds))?;
            } else {
                self.logger.log(&outcome.to_string())?;
            }
        }

        let summary = format!("extract {} ({}): {}",
                              self.root.display(), self.api.config().extraction.policy, report);
        println!("{}", summary);
        self.logger.log(&summary)?;
        Ok(())
    }
}
