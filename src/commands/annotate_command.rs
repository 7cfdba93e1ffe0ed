//! Interactive annotation command
//!
//! Runs the annotation session over a terminal surface. Commands are read
//! from stdin, or from a script file when `--script` is given.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::annotation::{AnnotationSession, SessionController, SurfaceEvent, TerminalSurface};
use crate::api::VoxPatch;
use crate::commands::command_traits::Command;
use crate::errors::{PatchError, PatchResult};
use crate::utils::logger::Logger;

pub struct AnnotateCommand<'a> {
    input_file: PathBuf,
    script: Option<PathBuf>,
    api: &'a VoxPatch,
    logger: &'a Logger,
}

impl<'a> AnnotateCommand<'a> {
    pub fn new(args: &ArgMatches, api: &'a VoxPatch, logger: &'a Logger) -> PatchResult<Self> {
        let input_file = args.get_one::<PathBuf>("input")
            .ok_or_else(|| PatchError::InvalidInput("Missing input volume".to_string()))?
            .clone();
        let script = args.get_one::<PathBuf>("script").cloned();

        Ok(AnnotateCommand { input_file, script, api, logger })
    }

    fn run_with<R: BufRead>(&self, input: R) -> PatchResult<()> {
        let session = AnnotationSession::new(&self.api.config().store_suffix);
        let surface = TerminalSurface::new(input, io::stdout());
        let mut controller = SessionController::new(session, surface);

        controller.handle(SurfaceEvent::Load(self.input_file.clone()));
        if controller.session().volume().is_none() {
            return Err(PatchError::InvalidInput(format!(
                "{} could not be opened for annotation", self.input_file.display())));
        }

        let events = controller.run();
        let session = controller.session();
        let summary = format!("annotate {}: {} annotations after {} commands, store {}",
                              self.input_file.display(), session.annotations().len(), events,
                              session.store_path().map(|p| p.display().to_string()).unwrap_or_default());
        info!("{}", summary);
        self.logger.log(&summary)?;
        Ok(())
    }
}

impl<'a> Command for AnnotateCommand<'a> {
    fn execute(&self) -> PatchResult<()> {
        match &self.script {
            Some(path) => self.run_with(BufReader::new(File::open(path)?)),
            None => self.run_with(io::stdin().lock()),
        }
    }
}
