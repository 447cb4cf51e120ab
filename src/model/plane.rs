//! Anatomical slicing planes.

use serde::{Deserialize, Serialize};

/// One of the supported anatomical slicing axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    /// Horizontal sections, top to bottom.
    Axial,
    /// Frontal sections, front to back.
    Coronal,
    /// Side sections, left to right.
    Sagittal,
}

impl Default for Plane {
    fn default() -> Self {
        Plane::Axial
    }
}

impl Plane {
    /// All planes in their fixed page-ordering.
    ///
    /// The flat page index space concatenates planes in this order, so the
    /// ordering here is load-bearing for page-number derivation.
    pub const ALL: [Plane; 3] = [Plane::Axial, Plane::Coronal, Plane::Sagittal];

    /// Lowercase name used in URLs and tile paths.
    pub fn name(&self) -> &'static str {
        match self {
            Plane::Axial => "axial",
            Plane::Coronal => "coronal",
            Plane::Sagittal => "sagittal",
        }
    }

    /// Stable index into per-plane arrays.
    pub fn index(self) -> usize {
        match self {
            Plane::Axial => 0,
            Plane::Coronal => 1,
            Plane::Sagittal => 2,
        }
    }

    /// Parse a plane from its name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Plane> {
        match name.to_ascii_lowercase().as_str() {
            "axial" => Some(Plane::Axial),
            "coronal" => Some(Plane::Coronal),
            "sagittal" => Some(Plane::Sagittal),
            _ => None,
        }
    }
}
