//! Viewport/slice coordination.
//!
//! The coordinator owns the active plane, the chosen slice per plane,
//! and the continuous view parameters (zoom, pan center, gamma,
//! contrast, edit-mode flag). It translates between (plane, slice) and
//! the flat page index the tile engine navigates by, builds the tile
//! source list for the configured backend, and records navigation
//! history steps: discrete moves immediately, continuous ones debounced.

mod nav;
mod tiles;

pub use nav::{HistoryRecorder, NavState};
pub use tiles::{
    FilePyramidSource, IipImageInfo, IipTileSource, TileSource, TileSourceKind,
    build_tile_sources,
};

use std::rc::Rc;

use web_time::Instant;

use crate::config::ViewerConfig;
use crate::model::{Plane, Region, RegionId};

/// Identifier of a registered viewport listener.
pub type ListenerId = u64;

type ListenerFn = Box<dyn FnMut(&ViewportState)>;

/// Snapshot of the viewport, handed to listeners on every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    /// Currently displayed plane.
    pub active_plane: Plane,
    /// Chosen slice per plane, indexed by [`Plane::index`].
    pub chosen_slice: [usize; 3],
    /// Zoom factor of the deep-zoom view.
    pub zoom: f64,
    /// Pan center in viewport coordinates.
    pub center: (f64, f64),
    /// Gamma adjustment forwarded to the tile backend.
    pub gamma: Option<f64>,
    /// Contrast adjustment forwarded to the tile backend.
    pub contrast: Option<f64>,
    /// Whether region editing is active.
    pub edit_mode: bool,
}

impl ViewportState {
    /// Slice currently chosen on the active plane.
    pub fn active_slice(&self) -> usize {
        self.chosen_slice[self.active_plane.index()]
    }
}

/// The viewport coordinator.
pub struct ViewportCoordinator {
    config: Rc<ViewerConfig>,
    state: ViewportState,
    history: HistoryRecorder,
    /// Page the tile engine should navigate to, not yet consumed.
    pending_page: Option<usize>,
    /// Regions to center on once the overlay for the new slice loads.
    pending_center_regions: Option<Vec<RegionId>>,
    listeners: Vec<(ListenerId, ListenerFn)>,
    next_listener: ListenerId,
}

impl ViewportCoordinator {
    /// Create a coordinator positioned on the first enabled plane,
    /// slice 0.
    pub fn new(config: Rc<ViewerConfig>) -> Self {
        let active_plane = Plane::ALL
            .into_iter()
            .find(|p| config.slide_count(*p) > 0)
            .unwrap_or_default();
        let state = ViewportState {
            active_plane,
            chosen_slice: [0; 3],
            zoom: 1.0,
            center: (0.5, 0.5),
            gamma: config.gamma,
            contrast: config.contrast,
            edit_mode: false,
        };
        Self {
            config,
            state,
            history: HistoryRecorder::new(),
            pending_page: None,
            pending_center_regions: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    /// The viewer configuration this coordinator was built with.
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Register a listener; it receives the full state snapshot on every
    /// mutation.
    pub fn add_listener(&mut self, listener: impl FnMut(&ViewportState) + 'static) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a previously registered listener.
    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    fn notify(&mut self) {
        let Self {
            state, listeners, ..
        } = self;
        for (_, callback) in listeners.iter_mut() {
            callback(state);
        }
    }

    // ------------------------------------------------------------------
    // Page index space
    // ------------------------------------------------------------------

    /// Flat page number of a (plane, slice) pair.
    pub fn page_for_plane_slice(&self, plane: Plane, slice: usize) -> usize {
        self.config.first_index(plane) + slice
    }

    /// Flat page number of the current position.
    pub fn current_page(&self) -> usize {
        self.page_for_plane_slice(self.state.active_plane, self.state.active_slice())
    }

    /// Invert a flat page number into its (plane, slice) pair.
    pub fn plane_slice_for_page(&self, page: usize) -> Option<(Plane, usize)> {
        for plane in Plane::ALL {
            let first = self.config.first_index(plane);
            let count = self.config.slide_count(plane);
            if page >= first && page < first + count {
                return Some((plane, page - first));
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Navigate to a plane and slice. Out-of-range slices clamp to the
    /// plane's bounds; navigating to the current position is a no-op.
    ///
    /// `center_on` defers a pan/zoom onto the named regions until the
    /// overlay for the new slice reports loaded (see
    /// [`ViewportCoordinator::overlay_loaded`]).
    pub fn go_to_plane_slice(
        &mut self,
        plane: Plane,
        slice: i64,
        center_on: Option<Vec<RegionId>>,
    ) {
        let clamped = self.config.clamp_slice(plane, slice);
        if plane == self.state.active_plane && clamped == self.state.active_slice() {
            log::debug!("navigation to current position ignored");
            return;
        }
        self.state.active_plane = plane;
        self.state.chosen_slice[plane.index()] = clamped;
        self.pending_page = Some(self.current_page());
        if center_on.is_some() {
            self.pending_center_regions = center_on;
        }
        // Discrete move: the history step commits synchronously.
        self.history.push_immediate(NavState {
            plane: Some(plane),
            slice: Some(clamped),
            ..NavState::default()
        });
        self.notify();
    }

    /// Navigate to a region's most representative slice, preferring the
    /// active plane and falling back to any plane the region names.
    pub fn go_to_region(&mut self, region: &Region) {
        let target = region
            .center_slices
            .get(&self.state.active_plane)
            .map(|slice| (self.state.active_plane, *slice))
            .or_else(|| {
                Plane::ALL
                    .into_iter()
                    .find_map(|p| region.center_slices.get(&p).map(|s| (p, *s)))
            });
        if let Some((plane, slice)) = target {
            self.go_to_plane_slice(plane, slice as i64, Some(vec![region.abb.clone()]));
        } else {
            log::debug!("region '{}' has no center slice", region.abb);
        }
    }

    /// Take the pending page navigation request for the tile engine.
    pub fn take_page_request(&mut self) -> Option<usize> {
        self.pending_page.take()
    }

    /// Called when the overlay for the current slice finished loading;
    /// returns the regions a deferred centering should pan/zoom onto.
    pub fn overlay_loaded(&mut self) -> Option<Vec<RegionId>> {
        self.pending_center_regions.take()
    }

    /// Update the continuous view parameters (pan/zoom). Commits to
    /// history behind the debounce quiet period.
    pub fn set_view(&mut self, zoom: f64, center: (f64, f64), now: Instant) {
        if !(zoom.is_finite() && zoom > 0.0) {
            log::debug!("ignoring non-positive zoom {}", zoom);
            return;
        }
        self.state.zoom = zoom;
        self.state.center = center;
        self.history.push_debounced(self.current_nav_state(), now);
        self.notify();
    }

    /// Update the gamma adjustment (continuous slider; debounced).
    pub fn set_gamma(&mut self, gamma: Option<f64>, now: Instant) {
        self.state.gamma = gamma;
        self.history.push_debounced(self.current_nav_state(), now);
        self.notify();
    }

    /// Update the contrast adjustment (continuous slider; debounced).
    pub fn set_contrast(&mut self, contrast: Option<f64>, now: Instant) {
        self.state.contrast = contrast;
        self.history.push_debounced(self.current_nav_state(), now);
        self.notify();
    }

    /// Toggle region-edit mode. Discrete: commits immediately.
    pub fn set_edit_mode(&mut self, edit_mode: bool) {
        if self.state.edit_mode == edit_mode {
            return;
        }
        self.state.edit_mode = edit_mode;
        self.history.push_immediate(self.current_nav_state());
        self.notify();
    }

    /// Flush debounced history commits; the host loop drives this.
    pub fn poll_history(&mut self, now: Instant) {
        self.history.poll(now);
    }

    /// Committed navigation-history steps, oldest first.
    pub fn history_steps(&self) -> &[NavState] {
        self.history.steps()
    }

    // ------------------------------------------------------------------
    // Nav-state round-trip
    // ------------------------------------------------------------------

    /// The full current navigation state, ready for URL encoding.
    pub fn current_nav_state(&self) -> NavState {
        NavState {
            plane: Some(self.state.active_plane),
            slice: Some(self.state.active_slice()),
            zoom: Some(self.state.zoom),
            center_x: Some(self.state.center.0),
            center_y: Some(self.state.center.1),
            gamma: self.state.gamma,
            contrast: self.state.contrast,
            edit_mode: Some(self.state.edit_mode),
        }
    }

    /// Replay a decoded navigation state (history back/forward or a
    /// shared URL). Absent fields keep their current values; nothing is
    /// pushed to history, since the step already exists there.
    pub fn apply_nav_state(&mut self, nav: &NavState) {
        if let Some(plane) = nav.plane {
            self.state.active_plane = plane;
            if let Some(slice) = nav.slice {
                self.state.chosen_slice[plane.index()] =
                    self.config.clamp_slice(plane, slice as i64);
            }
            self.pending_page = Some(self.current_page());
        }
        if let Some(zoom) = nav.zoom {
            self.state.zoom = zoom;
        }
        if let (Some(x), Some(y)) = (nav.center_x, nav.center_y) {
            self.state.center = (x, y);
        }
        if nav.gamma.is_some() {
            self.state.gamma = nav.gamma;
        }
        if nav.contrast.is_some() {
            self.state.contrast = nav.contrast;
        }
        if let Some(edit_mode) = nav.edit_mode {
            self.state.edit_mode = edit_mode;
        }
        self.notify();
    }

    // ------------------------------------------------------------------
    // Tile sources
    // ------------------------------------------------------------------

    /// Build the ordered tile-source list for the tile engine.
    pub fn tile_sources(&self, iip_info: Option<&IipImageInfo>) -> Vec<TileSource> {
        build_tile_sources(&self.config, self.state.gamma, self.state.contrast, iip_info)
    }
}
