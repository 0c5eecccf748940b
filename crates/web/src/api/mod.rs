//! REST API endpoint modules.

pub mod conflicts;
pub mod normalize;
pub mod resolve;
pub mod status;
