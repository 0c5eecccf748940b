//! Conflict-marker scanning and resolution.
//!
//! The conflict subsystem is responsible for:
//! 1. **Markers** -- recognizing the `<<<<<<<` / `=======` / `>>>>>>>` tokens.
//! 2. **Extraction** -- turning a marked-up buffer into structured regions.
//! 3. **Resolution** -- applying head, incoming, or AI-merged content.

pub mod extractor;
pub mod markers;
pub mod resolver;

pub use extractor::{ConflictExtractor, ConflictRegion};
pub use markers::contains_marker_token;
pub use resolver::{ConflictResolver, Resolution};
