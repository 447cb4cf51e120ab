//! Viewer configuration.
//!
//! The configuration is supplied by the hosting application (typically
//! deserialized from a JSON settings payload) and is read-only for the
//! lifetime of the viewer. Missing optional fields degrade to defaults
//! rather than failing the whole load.

use serde::Deserialize;

use crate::error::ViewerError;
use crate::model::Plane;

/// Default fill opacity for unselected overlay regions.
pub const DEFAULT_FILL_OPACITY: f64 = 0.4;

/// Quiet period before a continuous interaction (pan/zoom) is committed
/// to history, in milliseconds.
pub const HISTORY_DEBOUNCE_MS: u64 = 500;

/// Per-plane slicing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaneConfig {
    /// Number of slices available on this axis.
    pub slide_count: usize,
    /// Physical step between consecutive slices, in image units.
    #[serde(default = "default_slide_step")]
    pub slide_step: f64,
    /// Whether this axis is navigable at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_slide_step() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            slide_count: 0,
            slide_step: 1.0,
            enabled: false,
        }
    }
}

/// Which backend protocol serves the tile pyramid.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum BackendMode {
    /// No backend server: tiles are plain files under the data root.
    File,
    /// IIIF image server; one info endpoint per slice.
    Iiif {
        /// Server base URL.
        base_url: String,
    },
    /// IIP image server; one pyramidal image per slice, shared geometry.
    Iip {
        /// Server FIF endpoint URL.
        base_url: String,
        /// Server-side path template of the pyramidal image; `{plane}` and
        /// `{slice}` placeholders are substituted per slice.
        image_path: String,
    },
}

/// Static configuration of the viewer core.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    /// Square source image size in pixels (slices share dimensions).
    pub image_size: u32,
    /// Root path or URL of the data set.
    pub data_root_path: String,
    /// Key of the displayed image layer (e.g. staining).
    pub layer: String,
    /// Backend protocol for tile sources.
    pub backend: BackendMode,
    /// Per-plane slicing setup, indexed by [`Plane::index`].
    #[serde(default)]
    pub planes: [PlaneConfig; 3],
    /// Row-major 4x4 affine matrix mapping image space to physical space.
    /// Absent means physical coordinates are unavailable.
    #[serde(default)]
    pub matrix: Option<[[f64; 4]; 4]>,
    /// Fill opacity of unselected overlay regions.
    #[serde(default = "default_fill_opacity")]
    pub overlay_fill_opacity: f64,
    /// Default gamma adjustment, forwarded to IIP tile URLs.
    #[serde(default)]
    pub gamma: Option<f64>,
    /// Default contrast adjustment, forwarded to IIP tile URLs.
    #[serde(default)]
    pub contrast: Option<f64>,
}

fn default_fill_opacity() -> f64 {
    DEFAULT_FILL_OPACITY
}

impl ViewerConfig {
    /// Parse a configuration from its JSON payload.
    ///
    /// Fails fast: a viewer without a usable configuration has no
    /// meaningful interaction left.
    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ViewerError> {
        if self.image_size == 0 {
            return Err(ViewerError::config("image_size must be non-zero"));
        }
        if !Plane::ALL.iter().any(|p| self.plane(*p).enabled) {
            return Err(ViewerError::config("no plane is enabled"));
        }
        Ok(())
    }

    /// Configuration of one plane.
    pub fn plane(&self, plane: Plane) -> &PlaneConfig {
        &self.planes[plane.index()]
    }

    /// Number of slices on a plane (0 when the plane is disabled).
    pub fn slide_count(&self, plane: Plane) -> usize {
        let cfg = self.plane(plane);
        if cfg.enabled { cfg.slide_count } else { 0 }
    }

    /// First flat page index of a plane.
    ///
    /// Planes are concatenated into one flat page index space in
    /// [`Plane::ALL`] order, so `axial` starts at 0, `coronal` at
    /// `axial_count`, and so on.
    pub fn first_index(&self, plane: Plane) -> usize {
        Plane::ALL
            .iter()
            .take_while(|p| **p != plane)
            .map(|p| self.slide_count(*p))
            .sum()
    }

    /// Total number of pages across all enabled planes.
    pub fn total_pages(&self) -> usize {
        Plane::ALL.iter().map(|p| self.slide_count(*p)).sum()
    }

    /// Clamp a requested slice into the valid range of a plane.
    pub fn clamp_slice(&self, plane: Plane, slice: i64) -> usize {
        let count = self.slide_count(plane);
        if count == 0 {
            return 0;
        }
        slice.clamp(0, count as i64 - 1) as usize
    }
}
