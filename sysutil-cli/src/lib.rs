//! Shared pieces of the `myls` and `mycp` binaries.
//!
//! The binaries themselves only parse arguments, everything they do lives here so it
//! can be exercised from tests and from the self-test probes.

pub mod cfgs;
pub mod cp;
pub mod logging;
pub mod ls;
pub mod probes;
pub mod selftest;
