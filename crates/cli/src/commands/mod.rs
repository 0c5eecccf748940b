//! Conflict-handling subcommands: scan, resolve, normalize.

pub mod normalize;
pub mod resolve;
pub mod scan;
pub mod style;
