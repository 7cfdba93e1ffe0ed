//! Utility modules for common functionality

pub mod logger;
pub mod progress;
pub(crate) mod write_utils;
pub mod tiff_code_translators;
pub(crate) mod ifd_utils;
pub(crate) mod format_utils;
pub(crate) mod tag_utils;
pub mod preview_utils;
