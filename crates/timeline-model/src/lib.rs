//! Trimline Timeline Model
//!
//! Defines the core data contracts of the trimming timeline:
//! - **Source:** Stable identity of the loaded video and its decodable locator
//! - **Viewport:** Zoomable visible sub-range sized to a fixed slot count
//! - **Selection:** Start/end trim bounds kept ordered by auto-swap
//!
//! All times are seconds relative to the start of the source.

pub mod selection;
pub mod source;
pub mod viewport;

pub use selection::*;
pub use source::*;
pub use viewport::*;
