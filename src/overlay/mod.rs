//! Per-slice region overlay synchronization.
//!
//! On every slice change the previous slice's bound paths are
//! discarded, the SVG document for the new slice is fetched (network
//! fetch is an external collaborator) and parsed into
//! [`OverlayRegionEntry`] records, and the visual presentation of every
//! path is reconciled with the selection state.
//!
//! Fetches are asynchronous and the user may change slices again before
//! one resolves, so every completion is checked against the currently
//! requested slice; stale responses are discarded without touching
//! shared state.

mod svg;

pub use svg::{Bounds, ParsedPath, bounding_box, parse_overlay_paths, parse_path_data,
    path_data_from_rings, write_overlay_document};

use std::collections::HashMap;
use std::rc::Rc;

use crate::catalogue::RegionCatalogue;
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::model::{Plane, RegionId, Side};
use crate::selection::{ActionSource, SelectionState, SelectionStateMachine};

/// Fixed border color of selected regions.
pub const SELECTED_STROKE_COLOR: [u8; 3] = [0, 0, 255];

/// Opacity bump applied to selected regions on top of the configured
/// fill opacity.
pub const SELECTED_OPACITY_BUMP: f64 = 0.2;

/// One bound overlay path for the currently displayed slice.
///
/// Rebuilt from scratch whenever the slice changes; never reused across
/// slices.
#[derive(Debug, Clone)]
pub struct OverlayRegionEntry {
    /// Unique per-slice path identity: the raw id, ordinal-suffixed for
    /// repeated ids (non-contiguous same-region shapes, e.g. bilateral
    /// structures).
    pub path_id: String,
    /// Raw id attribute from the document.
    pub svg_id: String,
    /// Region abbreviation with any side suffix stripped.
    pub region: RegionId,
    /// Side annotation when the id carried `_L`/`_R`.
    pub side: Option<Side>,
    /// Path data of the outline.
    pub d: String,
    /// Bounding box of the outline.
    pub bbox: Option<Bounds>,
}

impl OverlayRegionEntry {
    /// Whether this is the background sentinel (click = unselect all).
    pub fn is_background(&self) -> bool {
        self.svg_id == "background"
    }
}

/// Visual presentation of one overlay path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStyle {
    /// Area fill opacity; 0 means hidden.
    pub fill_opacity: f64,
    /// Border color, when a border is shown.
    pub stroke: Option<[u8; 3]>,
    /// Whether the fill is brightened (mouse-over feedback).
    pub brighten: bool,
}

impl PathStyle {
    fn hidden() -> Self {
        Self {
            fill_opacity: 0.0,
            stroke: None,
            brighten: false,
        }
    }
}

/// A requested overlay fetch, handed to the network collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    /// Freshness token; pass back to [`OverlaySynchronizer::complete_fetch`].
    pub request: u64,
    /// URL of the per-slice overlay document.
    pub url: String,
    /// Plane the request is for.
    pub plane: Plane,
    /// Slice the request is for.
    pub slice: usize,
}

struct SliceOverlay {
    plane: Plane,
    slice: usize,
    entries: Vec<OverlayRegionEntry>,
}

/// Synchronizer between the displayed slice, its overlay document and
/// the selection state.
pub struct OverlaySynchronizer {
    catalogue: Rc<RegionCatalogue>,
    data_root_path: String,
    fill_opacity: f64,
    border_enabled: bool,
    request_counter: u64,
    requested: Option<(Plane, usize)>,
    current: Option<SliceOverlay>,
    hovered: Option<String>,
}

impl OverlaySynchronizer {
    /// Create a synchronizer for the given catalogue and configuration.
    pub fn new(catalogue: Rc<RegionCatalogue>, config: &ViewerConfig) -> Self {
        Self {
            catalogue,
            data_root_path: config.data_root_path.clone(),
            fill_opacity: config.overlay_fill_opacity,
            border_enabled: false,
            request_counter: 0,
            requested: None,
            current: None,
            hovered: None,
        }
    }

    /// Begin loading the overlay for a slice.
    ///
    /// The previous slice's bound paths are discarded right away; the
    /// returned ticket carries the freshness token the fetch completion
    /// must present.
    pub fn request_slice(&mut self, plane: Plane, slice: usize) -> FetchTicket {
        self.request_counter += 1;
        self.requested = Some((plane, slice));
        self.current = None;
        self.hovered = None;
        FetchTicket {
            request: self.request_counter,
            url: format!(
                "{}/svg/{}/{}.svg",
                self.data_root_path,
                plane.name(),
                slice
            ),
            plane,
            slice,
        }
    }

    /// Apply a completed overlay fetch.
    ///
    /// Returns `Ok(true)` when the document was installed, `Ok(false)`
    /// when the response was stale (a newer slice was requested while
    /// this fetch was in flight) and therefore discarded.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, svg: &str) -> Result<bool, ViewerError> {
        if ticket.request != self.request_counter {
            log::debug!(
                "discarding stale overlay response {} (current {})",
                ticket.request,
                self.request_counter
            );
            return Ok(false);
        }
        let parsed = parse_overlay_paths(svg)?;
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut entries = Vec::with_capacity(parsed.len());
        for path in parsed {
            let occurrence = seen.entry(path.id.clone()).or_insert(0);
            *occurrence += 1;
            let path_id = if *occurrence == 1 {
                path.id.clone()
            } else {
                format!("{}_{}", path.id, occurrence)
            };
            let (region, side) = split_side(&path.id);
            let region = region.to_string();
            let rings = parse_path_data(&path.d);
            entries.push(OverlayRegionEntry {
                path_id,
                svg_id: path.id,
                region,
                side,
                bbox: bounding_box(&rings),
                d: path.d,
            });
        }
        log::debug!(
            "overlay loaded for {:?}/{}: {} paths",
            ticket.plane,
            ticket.slice,
            entries.len()
        );
        self.current = Some(SliceOverlay {
            plane: ticket.plane,
            slice: ticket.slice,
            entries,
        });
        Ok(true)
    }

    /// Whether the overlay for the requested slice is installed.
    pub fn is_loaded(&self) -> bool {
        match (&self.current, self.requested) {
            (Some(current), Some((plane, slice))) => {
                current.plane == plane && current.slice == slice
            }
            _ => false,
        }
    }

    /// Bound paths of the current slice.
    pub fn entries(&self) -> &[OverlayRegionEntry] {
        self.current.as_ref().map(|c| c.entries.as_slice()).unwrap_or(&[])
    }

    /// Look up an entry by its per-slice path id.
    pub fn entry(&self, path_id: &str) -> Option<&OverlayRegionEntry> {
        self.entries().iter().find(|e| e.path_id == path_id)
    }

    /// Unique region abbreviations present in the current slice, in
    /// document order. Feeds "regions in current slice" highlighting.
    pub fn regions_in_slice(&self) -> Vec<RegionId> {
        let mut out: Vec<RegionId> = Vec::new();
        for entry in self.entries() {
            if !entry.is_background() && !out.contains(&entry.region) {
                out.push(entry.region.clone());
            }
        }
        out
    }

    /// Route a click on an overlay path into the selection machine,
    /// tagged with the viewer's action source. Clicking the background
    /// clears the selection; `extend` adds instead of replacing.
    pub fn click_path(
        &self,
        machine: &mut SelectionStateMachine,
        path_id: &str,
        extend: bool,
    ) {
        let Some(entry) = self.entry(path_id) else {
            log::debug!("click on unknown overlay path '{}'", path_id);
            return;
        };
        let mut viewer = machine.actionner(ActionSource::Viewer);
        if entry.is_background() {
            viewer.unselect_all();
        } else if extend {
            viewer.add_to_selection(entry.region.clone());
        } else {
            viewer.replace_selected(vec![entry.region.clone()]);
        }
    }

    /// Track the hovered path (or none).
    pub fn set_hovered(&mut self, path_id: Option<&str>) {
        self.hovered = path_id.map(str::to_string);
    }

    /// Toggle borders on unselected regions.
    pub fn set_border_enabled(&mut self, enabled: bool) {
        self.border_enabled = enabled;
    }

    /// Presentation of one entry under the given selection state.
    pub fn style_for(&self, entry: &OverlayRegionEntry, selection: &SelectionState) -> PathStyle {
        if entry.is_background() {
            return PathStyle::hidden();
        }
        // Regions absent from the catalogue or flagged as not existing
        // stay invisible.
        let known = self
            .catalogue
            .region(&entry.region)
            .map(|r| r.exists)
            .unwrap_or(false);
        if !known {
            return PathStyle::hidden();
        }
        if selection.is_selected(&entry.region) {
            return PathStyle {
                fill_opacity: (self.fill_opacity + SELECTED_OPACITY_BUMP).min(1.0),
                stroke: Some(SELECTED_STROKE_COLOR),
                brighten: false,
            };
        }
        let region_color = self
            .catalogue
            .region(&entry.region)
            .map(|r| r.color)
            .unwrap_or([0, 0, 0]);
        if self.hovered.as_deref() == Some(entry.path_id.as_str()) {
            return PathStyle {
                fill_opacity: self.fill_opacity,
                stroke: Some(region_color),
                brighten: true,
            };
        }
        PathStyle {
            fill_opacity: self.fill_opacity,
            stroke: self.border_enabled.then_some(region_color),
            brighten: false,
        }
    }

    /// Reconcile the whole overlay with the selection state, producing
    /// one style per bound path.
    pub fn reconcile(&self, selection: &SelectionState) -> Vec<(String, PathStyle)> {
        self.entries()
            .iter()
            .map(|entry| (entry.path_id.clone(), self.style_for(entry, selection)))
            .collect()
    }

    /// Install a committed edit: the entry keeps its path id (and with
    /// it the interaction wiring), only the outline and bounding box
    /// change. Returns false when the path no longer exists, e.g. after
    /// a slice change abandoned the session.
    pub fn apply_edit(&mut self, path_id: &str, d: &str) -> bool {
        let Some(current) = self.current.as_mut() else {
            return false;
        };
        let Some(entry) = current.entries.iter_mut().find(|e| e.path_id == path_id) else {
            log::debug!("edit for unknown overlay path '{}' dropped", path_id);
            return false;
        };
        entry.bbox = bounding_box(&parse_path_data(d));
        entry.d = d.to_string();
        true
    }

    /// Export the current slice's overlay as an SVG document, edits
    /// included. `None` when no overlay is installed.
    pub fn to_svg(&self) -> Option<Result<String, ViewerError>> {
        let current = self.current.as_ref()?;
        let paths: Vec<ParsedPath> = current
            .entries
            .iter()
            .map(|e| ParsedPath {
                id: e.svg_id.clone(),
                d: e.d.clone(),
            })
            .collect();
        Some(write_overlay_document(&paths))
    }

    /// Scale factor the overlay's coordinate transform must adopt to
    /// track the tile viewport. Recomputed on every pan/zoom/resize
    /// frame of the host tile engine.
    pub fn overlay_scale(zoom: f64, container_width: f64, image_width: f64) -> f64 {
        if image_width <= 0.0 {
            return 1.0;
        }
        zoom * container_width / image_width
    }
}

/// Split a raw path id into region abbreviation and side suffix.
fn split_side(id: &str) -> (&str, Option<Side>) {
    if let Some(region) = id.strip_suffix("_L") {
        (region, Some(Side::Left))
    } else if let Some(region) = id.strip_suffix("_R") {
        (region, Some(Side::Right))
    } else {
        (id, None)
    }
}
