//! Region and grouping data models.

use std::collections::HashMap;

use crate::model::Plane;

/// Stable identifier of a region: its unique abbreviation.
///
/// This is an identifier, not a display label; the display label is the
/// region's long `name`.
pub type RegionId = String;

/// Left/right side annotation for bilateral structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Suffix carried by overlay path ids for this side (`_L` / `_R`).
    pub fn suffix(&self) -> &'static str {
        match self {
            Side::Left => "_L",
            Side::Right => "_R",
        }
    }
}

/// One entry of the region catalogue.
///
/// Created in bulk when the catalogue payload loads; immutable for the
/// rest of the session apart from the `exists` flag.
#[derive(Debug, Clone)]
pub struct Region {
    /// Unique abbreviation, the region's identity.
    pub abb: RegionId,
    /// Long display name.
    pub name: String,
    /// Parent abbreviation; `None` only for the single root.
    pub parent: Option<RegionId>,
    /// Ordered child abbreviations.
    pub children: Vec<RegionId>,
    /// RGB display color.
    pub color: [u8; 3],
    /// Whether the region is present in at least one loaded slice.
    pub exists: bool,
    /// Per-axis slice index where the region is most representative.
    pub center_slices: HashMap<Plane, usize>,
    /// Grouping scheme id -> group id memberships.
    pub groups: HashMap<String, String>,
    /// Ordered ancestor abbreviations, root first, parent last.
    /// Stamped once at catalogue load.
    pub trail: Vec<RegionId>,
    /// Uppercased name for case-insensitive search.
    pub name_upper: String,
    /// Uppercased abbreviation for case-insensitive search.
    pub abb_upper: String,
}

impl Region {
    /// Whether this region has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Case-insensitive substring match against name and abbreviation.
    ///
    /// `pattern` must already be uppercased by the caller.
    pub fn matches_upper(&self, pattern: &str) -> bool {
        self.name_upper.contains(pattern) || self.abb_upper.contains(pattern)
    }
}

/// A named partition scheme over regions, used for highlight-by-category.
/// Read-only after load.
#[derive(Debug, Clone)]
pub struct Grouping {
    /// Display name of the scheme.
    pub name: String,
    /// Group id -> group display name.
    pub group_names: HashMap<String, String>,
}

/// Display status of a region under the current highlighting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightStatus {
    /// Direct match of the active highlight.
    Highlighted,
    /// Not a match itself, but an ancestor needed to keep the tree connected.
    Filtered,
    /// Highlighting is active but this region is neither matched nor an ancestor.
    Dimmed,
    /// Highlighting is not active.
    Off,
}

impl HighlightStatus {
    /// Compact status code used by tree renderers.
    pub fn code(&self) -> &'static str {
        match self {
            HighlightStatus::Highlighted => "H",
            HighlightStatus::Filtered => "F",
            HighlightStatus::Dimmed => "0",
            HighlightStatus::Off => "no",
        }
    }
}
