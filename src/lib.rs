pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod volume;
pub mod codec;
pub mod annotation;
pub mod extractor;
pub mod batch;
pub mod config;
pub mod errors;
pub mod commands;
pub mod api;

pub use crate::api::VoxPatch;
pub use crate::config::Config;
pub use crate::errors::{PatchError, PatchResult};

pub use tiff::{VolumeReader, VolumeWriter};
pub use volume::{SampleType, Volume};
pub use annotation::{Annotation, AnnotationSession, AnnotationStore, Point};
pub use extractor::{Extraction, ExtractionPolicy, ExtractionSettings, PatchExtractor};
pub use batch::{BatchDriver, BatchLayout, BatchReport};
