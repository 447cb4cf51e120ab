//! Data models for the viewer synchronization core.

mod plane;
mod region;

pub use plane::Plane;
pub use region::{Grouping, HighlightStatus, Region, RegionId, Side};
