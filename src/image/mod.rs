//! Image re-mastering: tool detection, work areas, `xorriso` invocation and
//! the build pipeline that ties them together.

pub mod builder;
pub mod checksum;
pub mod mastering;
pub mod tool;
pub mod workarea;

pub use builder::{BuildOutcome, ImageBuilder};
pub use tool::ToolDetector;
pub use workarea::WorkArea;
