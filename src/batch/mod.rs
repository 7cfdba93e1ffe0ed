//! Offline patch extraction over many volumes

mod layout;
mod report;
mod driver;

pub use layout::{BatchLayout, LayoutOrganizer, OrganizeReport};
pub use report::{BatchReport, SkipReason, VolumeOutcome, VolumeReport};
pub use driver::BatchDriver;
