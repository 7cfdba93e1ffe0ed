use clap::{value_parser, Arg, ArgAction, Command as ClapCommand};
use std::path::PathBuf;
use std::process;
use log::{error, LevelFilter};

use voxpatch::api::VoxPatch;
use voxpatch::commands::{CommandFactory, VoxpatchCommandFactory};
use voxpatch::config::Config;
use voxpatch::utils::logger::Logger;

fn build_cli() -> ClapCommand {
    ClapCommand::new("voxpatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Point annotation and patch extraction for multi-page 3D TIFF volumes")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file (default: ./voxpatch.toml when present)")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write log records to this file instead of the console")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            ClapCommand::new("annotate")
                .about("Label points on the middle slice of a volume")
                .arg(
                    Arg::new("input")
                        .help("Input volume (multi-page TIFF)")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .index(1),
                )
                .arg(
                    Arg::new("script")
                        .long("script")
                        .help("Read session commands from this file instead of stdin")
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            ClapCommand::new("extract")
                .about("Extract patches around every annotation of every volume under a root")
                .arg(
                    Arg::new("root")
                        .help("Directory holding the Cube_<id> volume directories")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .index(1),
                )
                .arg(
                    Arg::new("policy")
                        .long("policy")
                        .help("Boundary policy: bounded, padded or sparse")
                        .value_name("POLICY"),
                )
                .arg(
                    Arg::new("patch-size")
                        .long("patch-size")
                        .help("Patch edge length in voxels (even)")
                        .value_name("N")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("compression")
                        .long("compression")
                        .help("Patch compression: none, deflate or zstd")
                        .value_name("NAME"),
                )
                .arg(
                    Arg::new("no-progress")
                        .long("no-progress")
                        .help("Hide the progress bar")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            ClapCommand::new("organize")
                .about("Copy Cube_<id>_crop.tif files into per-volume directories")
                .arg(
                    Arg::new("source")
                        .help("Folder holding the crop files")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .index(1),
                ),
        )
        .subcommand(
            ClapCommand::new("info")
                .about("Describe a volume file")
                .arg(
                    Arg::new("input")
                        .help("Input TIFF file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .index(1),
                ),
        )
}

fn main() {
    let matches = build_cli().get_matches();

    let mut config = match Config::resolve(matches.get_one::<PathBuf>("config").map(PathBuf::as_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if matches.get_flag("verbose") {
        config.logging.level = LevelFilter::Debug;
    }
    if let Some(path) = matches.get_one::<PathBuf>("log-file") {
        config.logging.file = Some(path.clone());
    }

    if let Err(e) = Logger::init_logging(config.logging.level, config.logging.file.as_deref()) {
        eprintln!("Error setting up global logger: {}", e);
        process::exit(1);
    }

    let logger = match &config.logging.run_log {
        Some(path) => match Logger::new(path, LevelFilter::Info) {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error initializing run log: {}", e);
                process::exit(1);
            }
        },
        None => Logger::disabled(),
    };

    let api = VoxPatch::new(config);
    let factory = VoxpatchCommandFactory::new(&api);

    match factory.create_command(&matches, &logger) {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
