//! Navigation state: URL token round-trip and history recording.
//!
//! The shareable navigation state is a compact set of query-style tokens
//! (`a`=plane, `s`=slice, `z`=zoom, `x`/`y`=pan center, `GAM`/`CNT`=
//! image adjustments, `mode`=edit flag). Decoding is defensive:
//! every field validates independently and invalid or out-of-range
//! fields are silently dropped, never fatal, so URLs stay forward and
//! backward compatible with partial or malformed parameters.

use web_time::{Duration, Instant};

use crate::config::{HISTORY_DEBOUNCE_MS, ViewerConfig};
use crate::model::Plane;
use crate::scheduler::TaskScheduler;

/// Scheduler slot used by debounced history commits.
const HISTORY_SLOT: &str = "history-commit";

/// One navigation-state record; every field optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavState {
    /// Active plane.
    pub plane: Option<Plane>,
    /// Chosen slice on the active plane.
    pub slice: Option<usize>,
    /// Viewer zoom factor.
    pub zoom: Option<f64>,
    /// Pan center, horizontal viewport coordinate.
    pub center_x: Option<f64>,
    /// Pan center, vertical viewport coordinate.
    pub center_y: Option<f64>,
    /// Gamma adjustment.
    pub gamma: Option<f64>,
    /// Contrast adjustment.
    pub contrast: Option<f64>,
    /// Whether region editing is active.
    pub edit_mode: Option<bool>,
}

impl NavState {
    /// Serialize to URL query-style tokens. Absent fields are omitted.
    pub fn encode(&self) -> String {
        let mut tokens: Vec<String> = Vec::new();
        if let Some(plane) = self.plane {
            tokens.push(format!("a={}", plane.name()));
        }
        if let Some(slice) = self.slice {
            tokens.push(format!("s={}", slice));
        }
        if let Some(zoom) = self.zoom {
            tokens.push(format!("z={}", zoom));
        }
        if let Some(x) = self.center_x {
            tokens.push(format!("x={}", x));
        }
        if let Some(y) = self.center_y {
            tokens.push(format!("y={}", y));
        }
        if let Some(gamma) = self.gamma {
            tokens.push(format!("GAM={}", gamma));
        }
        if let Some(contrast) = self.contrast {
            tokens.push(format!("CNT={}", contrast));
        }
        if let Some(edit) = self.edit_mode {
            tokens.push(format!("mode={}", if edit { "edit" } else { "view" }));
        }
        tokens.join("&")
    }

    /// Parse URL tokens back into a navigation state.
    ///
    /// Unknown keys are ignored; fields that fail to parse or fall out
    /// of the configured range are dropped. A slice is only kept when
    /// the plane also decoded, since its valid range depends on it.
    pub fn decode(tokens: &str, config: &ViewerConfig) -> NavState {
        let mut state = NavState::default();
        let mut raw_slice: Option<usize> = None;
        for token in tokens.split('&') {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            match key {
                "a" => state.plane = Plane::from_name(value),
                "s" => raw_slice = value.parse().ok(),
                "z" => state.zoom = parse_positive(value),
                "x" => state.center_x = parse_finite(value),
                "y" => state.center_y = parse_finite(value),
                "GAM" => state.gamma = parse_positive(value),
                "CNT" => state.contrast = parse_positive(value),
                "mode" => {
                    state.edit_mode = match value {
                        "edit" => Some(true),
                        "view" => Some(false),
                        _ => None,
                    }
                }
                _ => log::debug!("ignoring unknown nav token '{}'", key),
            }
        }
        if let (Some(plane), Some(slice)) = (state.plane, raw_slice) {
            if slice < config.slide_count(plane) {
                state.slice = Some(slice);
            } else {
                log::debug!("dropping out-of-range slice {} for {:?}", slice, plane);
            }
        }
        state
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_positive(value: &str) -> Option<f64> {
    parse_finite(value).filter(|v| *v > 0.0)
}

/// Recorder of committed navigation-history steps.
///
/// Discrete interactions (slice/plane change, edit-mode toggle) commit
/// immediately; continuous interactions (pan/zoom, image adjustments)
/// coalesce behind a quiet period so that undo/redo granularity matches
/// user intent. The recorded steps are what the host hands to the
/// browser history API.
#[derive(Debug, Default)]
pub struct HistoryRecorder {
    steps: Vec<NavState>,
    scheduler: TaskScheduler<NavState>,
}

impl HistoryRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a step synchronously, superseding any pending debounced
    /// step.
    pub fn push_immediate(&mut self, state: NavState) {
        self.scheduler.cancel(HISTORY_SLOT);
        log::debug!("history step: {}", state.encode());
        self.steps.push(state);
    }

    /// Commit a step after the quiet period; rapid successors replace it.
    pub fn push_debounced(&mut self, state: NavState, now: Instant) {
        self.scheduler.schedule(
            HISTORY_SLOT,
            Duration::from_millis(HISTORY_DEBOUNCE_MS),
            now,
            state,
        );
    }

    /// Flush debounced steps whose quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) {
        for state in self.scheduler.poll(now) {
            log::debug!("history step (debounced): {}", state.encode());
            self.steps.push(state);
        }
    }

    /// All committed steps, oldest first.
    pub fn steps(&self) -> &[NavState] {
        &self.steps
    }

    /// The most recent committed step.
    pub fn last(&self) -> Option<&NavState> {
        self.steps.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_round_trip_plane_slice() {
        let config = test_config();
        let state = NavState {
            plane: Some(Plane::Coronal),
            slice: Some(12),
            ..NavState::default()
        };
        let decoded = NavState::decode(&state.encode(), &config);
        assert_eq!(decoded.plane, Some(Plane::Coronal));
        assert_eq!(decoded.slice, Some(12));
    }

    #[test]
    fn test_round_trip_full_state() {
        let config = test_config();
        let state = NavState {
            plane: Some(Plane::Axial),
            slice: Some(3),
            zoom: Some(2.5),
            center_x: Some(0.25),
            center_y: Some(0.75),
            gamma: Some(1.2),
            contrast: Some(0.9),
            edit_mode: Some(true),
        };
        assert_eq!(NavState::decode(&state.encode(), &config), state);
    }

    #[test]
    fn test_decode_drops_invalid_fields_individually() {
        let config = test_config();
        let decoded = NavState::decode("a=coronal&s=banana&z=-3&x=0.5&mode=fancy", &config);
        assert_eq!(decoded.plane, Some(Plane::Coronal));
        assert_eq!(decoded.slice, None);
        assert_eq!(decoded.zoom, None);
        assert_eq!(decoded.center_x, Some(0.5));
        assert_eq!(decoded.edit_mode, None);
    }

    #[test]
    fn test_decode_drops_out_of_range_slice() {
        let config = test_config();
        // Coronal has 20 slices; 99 is out of range.
        let decoded = NavState::decode("a=coronal&s=99", &config);
        assert_eq!(decoded.plane, Some(Plane::Coronal));
        assert_eq!(decoded.slice, None);
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let config = test_config();
        let decoded = NavState::decode("a=axial&s=3&utm_source=mail&", &config);
        assert_eq!(decoded.plane, Some(Plane::Axial));
        assert_eq!(decoded.slice, Some(3));
    }

    #[test]
    fn test_history_immediate_vs_debounced() {
        let now = Instant::now();
        let mut history = HistoryRecorder::new();

        // A pan burst coalesces into one step.
        for i in 0..5u32 {
            let state = NavState {
                zoom: Some(1.0 + f64::from(i)),
                ..NavState::default()
            };
            history.push_debounced(state, now + Duration::from_millis(u64::from(i) * 50));
        }
        history.poll(now + Duration::from_millis(200));
        assert!(history.steps().is_empty());
        history.poll(now + Duration::from_millis(800));
        assert_eq!(history.steps().len(), 1);
        assert_eq!(history.last().unwrap().zoom, Some(5.0));

        // A discrete step lands synchronously.
        history.push_immediate(NavState {
            plane: Some(Plane::Axial),
            slice: Some(2),
            ..NavState::default()
        });
        assert_eq!(history.steps().len(), 2);
    }

    #[test]
    fn test_immediate_supersedes_pending_debounce() {
        let now = Instant::now();
        let mut history = HistoryRecorder::new();
        history.push_debounced(
            NavState {
                zoom: Some(3.0),
                ..NavState::default()
            },
            now,
        );
        history.push_immediate(NavState {
            plane: Some(Plane::Coronal),
            slice: Some(1),
            ..NavState::default()
        });
        history.poll(now + Duration::from_secs(2));
        // The pan step was superseded by the slice change.
        assert_eq!(history.steps().len(), 1);
        assert_eq!(history.last().unwrap().slice, Some(1));
    }
}
