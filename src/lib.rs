//! AtlasView - synchronization core of a deep-zoom anatomical atlas viewer.
//!
//! Keeps a hierarchical region catalogue, the tree/viewer/search selection
//! state, viewport navigation and history, per-slice vector overlays, and
//! free-hand region editing consistent with each other. Rendering and
//! network transport are left to the embedding application; this crate
//! owns the state and the rules that tie it together.

pub mod catalogue;
pub mod config;
pub mod coords;
pub mod edit;
pub mod error;
pub mod model;
pub mod overlay;
pub mod scheduler;
pub mod selection;
pub mod viewport;

pub use catalogue::RegionCatalogue;
pub use config::{BackendMode, PlaneConfig, ViewerConfig};
pub use coords::CoordinateTransformer;
pub use edit::{CommittedEdit, EditPhase, EditTool, RegionEditEngine};
pub use error::ViewerError;
pub use model::{HighlightStatus, Plane, Region, RegionId, Side};
pub use overlay::{FetchTicket, OverlaySynchronizer, PathStyle};
pub use selection::{ActionSource, Actionner, SelectionState, SelectionStateMachine};
pub use viewport::{NavState, ViewportCoordinator, ViewportState};
