//! Interactive free-hand editing of a region's polygon.
//!
//! A drag gesture is a series of circular brush applications against
//! the working polygon: union for the pen, difference for the eraser.
//! The engine is a small state machine:
//!
//! ```text
//! idle -> (start) -> armed -> (pointer down) -> active-stroke
//!      -> (pointer up) -> armed -> (stop / start other region) -> idle
//! ```
//!
//! Entering `armed` converts the target path into the working polygon;
//! every accepted pointer move yields a fresh live-preview serialization.
//! Committing hands the final path data back to the overlay; an
//! abandoned session is simply dropped (no crash recovery by design).

mod brush;

pub use brush::{BRUSH_SEGMENTS, circle_polygon, multi_polygon_to_rings, rings_to_multi_polygon};

use geo::{BooleanOps, MultiPolygon, Simplify};

use crate::error::ViewerError;
use crate::overlay::{parse_path_data, path_data_from_rings};

/// Minimum pointer movement (in both axes) before a brush application
/// recomputes; bounds the boolean-op cost of slow drags.
pub const MIN_BRUSH_MOVE: f64 = 1.0;

/// Default brush radius in image pixels.
pub const DEFAULT_BRUSH_RADIUS: f64 = 10.0;

/// Default tolerance of the on-demand simplification pass.
pub const DEFAULT_SIMPLIFY_EPSILON: f64 = 0.5;

/// The two brush tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTool {
    /// Adds the brush circle to the region.
    Pen,
    /// Subtracts the brush circle from the region.
    Eraser,
}

/// Phase of the editing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    /// No edit session.
    Idle,
    /// A region is armed for editing; no button held.
    Armed,
    /// A drag is in progress.
    ActiveStroke,
}

/// The result of committing an edit session: the new path data to
/// install under the same path id.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedEdit {
    /// Per-slice path id of the edited region shape.
    pub path_id: String,
    /// New path data.
    pub d: String,
}

struct EditSession {
    path_id: String,
    working: MultiPolygon<f64>,
    last_point: Option<(f64, f64)>,
}

/// Interactive polygon editor; at most one session at a time.
pub struct RegionEditEngine {
    phase: EditPhase,
    session: Option<EditSession>,
    tool: EditTool,
    brush_radius: f64,
}

impl Default for RegionEditEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionEditEngine {
    /// Create an idle engine with the pen tool.
    pub fn new() -> Self {
        Self {
            phase: EditPhase::Idle,
            session: None,
            tool: EditTool::Pen,
            brush_radius: DEFAULT_BRUSH_RADIUS,
        }
    }

    /// Current phase of the state machine.
    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    /// The active tool.
    pub fn tool(&self) -> EditTool {
        self.tool
    }

    /// Switch between pen and eraser.
    pub fn set_tool(&mut self, tool: EditTool) {
        self.tool = tool;
    }

    /// Current brush radius in image pixels.
    pub fn brush_radius(&self) -> f64 {
        self.brush_radius
    }

    /// Set the brush radius; non-positive values are ignored.
    pub fn set_brush_radius(&mut self, radius: f64) {
        if radius.is_finite() && radius > 0.0 {
            self.brush_radius = radius;
        }
    }

    /// Path id of the region being edited, if any.
    pub fn editing_path(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.path_id.as_str())
    }

    /// Arm an edit session for a path.
    ///
    /// Selecting another region while a session is active commits the
    /// current session first; the committed edit is returned so the
    /// caller can install it.
    pub fn start(&mut self, path_id: &str, d: &str) -> Result<Option<CommittedEdit>, ViewerError> {
        let rings = parse_path_data(d);
        if rings.is_empty() {
            return Err(ViewerError::edit(format!(
                "path '{}' has no polygon outline",
                path_id
            )));
        }
        let committed = self.stop();
        log::debug!("edit session armed for '{}'", path_id);
        self.session = Some(EditSession {
            path_id: path_id.to_string(),
            working: rings_to_multi_polygon(&rings),
            last_point: None,
        });
        self.phase = EditPhase::Armed;
        Ok(committed)
    }

    /// Begin a stroke. Returns the live-preview path data.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<String> {
        if self.phase != EditPhase::Armed {
            return None;
        }
        self.phase = EditPhase::ActiveStroke;
        if let Some(session) = self.session.as_mut() {
            session.last_point = None;
        }
        self.apply_brush(x, y)
    }

    /// Continue a stroke. Returns fresh live-preview path data, or
    /// `None` when the move was below the recompute threshold.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<String> {
        if self.phase != EditPhase::ActiveStroke {
            return None;
        }
        if let Some((lx, ly)) = self.session.as_ref()?.last_point {
            if (x - lx).abs() < MIN_BRUSH_MOVE && (y - ly).abs() < MIN_BRUSH_MOVE {
                return None;
            }
        }
        self.apply_brush(x, y)
    }

    /// End the stroke; the session stays armed for further strokes.
    pub fn pointer_up(&mut self) {
        if self.phase == EditPhase::ActiveStroke {
            self.phase = EditPhase::Armed;
        }
    }

    /// Apply a polygon-simplification pass to the working polygon.
    /// Manual trigger: controls vertex growth from repeated strokes.
    /// Returns the updated preview.
    pub fn simplify(&mut self) -> Option<String> {
        let session = self.session.as_mut()?;
        session.working = session.working.simplify(&DEFAULT_SIMPLIFY_EPSILON);
        Some(session.preview())
    }

    /// Commit the session (double-click-to-stop). Returns the final
    /// path data to install under the original path id.
    pub fn stop(&mut self) -> Option<CommittedEdit> {
        self.phase = EditPhase::Idle;
        let session = self.session.take()?;
        log::debug!("edit session committed for '{}'", session.path_id);
        Some(CommittedEdit {
            d: session.preview(),
            path_id: session.path_id,
        })
    }

    /// Discard the session without committing (navigation away).
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("edit session discarded for '{}'", session.path_id);
        }
        self.phase = EditPhase::Idle;
    }

    /// Current live-preview path data.
    pub fn preview(&self) -> Option<String> {
        self.session.as_ref().map(EditSession::preview)
    }

    fn apply_brush(&mut self, x: f64, y: f64) -> Option<String> {
        let session = self.session.as_mut()?;
        let circle = MultiPolygon::new(vec![circle_polygon(x, y, self.brush_radius)]);
        session.working = match self.tool {
            EditTool::Pen => session.working.union(&circle),
            EditTool::Eraser => session.working.difference(&circle),
        };
        session.last_point = Some((x, y));
        Some(session.preview())
    }
}

impl EditSession {
    fn preview(&self) -> String {
        path_data_from_rings(&multi_polygon_to_rings(&self.working))
    }
}
