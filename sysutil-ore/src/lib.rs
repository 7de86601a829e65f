//! Small utilities shared by every `sysutil` crate.
//!
//! Nothing in here should reach for the operating system, that's the job of
//! `sysutil-filesystem`.

pub mod cast;
pub mod cstr;
pub mod env;
pub mod iter;
