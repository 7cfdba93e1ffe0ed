//! Low-level I/O helpers shared by the volume codec
//!
//! Byte order strategies and the seekable reader abstraction.

pub mod seekable;
pub mod byte_order;
