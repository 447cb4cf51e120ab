//! Action-source tagging and the per-producer mutation facade.
//!
//! Every producer of selection mutations (region tree, viewer clicks,
//! search box, edit tool, history replay) acts through an [`Actionner`]
//! bound to its own [`ActionSource`]. The source travels with each
//! mutation and ends up in the state snapshot, so subscribers can tell
//! their own just-made changes from everyone else's without feedback
//! loops.

use web_time::{Duration, Instant};

use crate::model::RegionId;
use crate::scheduler::TaskScheduler;
use crate::selection::{SelectionState, SelectionStateMachine};

/// Quiet period before a search pattern is applied as a highlight.
/// Continuous typing must not re-scan the catalogue on every keystroke.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Scheduler slot used by debounced search highlighting.
pub const SEARCH_SLOT: &str = "search-highlight";

/// Logical producer of a selection mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSource {
    /// The region hierarchy tree UI.
    Tree,
    /// Clicks and hovers on overlay paths in the viewer.
    Viewer,
    /// The search box.
    Search,
    /// The region edit tool.
    Editor,
    /// Browser-history replay (back/forward).
    History,
    /// Selection arriving from outside, e.g. a shared URL.
    External,
}

/// A pending debounced highlight request.
#[derive(Debug, Clone)]
pub struct HighlightRequest {
    /// Producer that typed the pattern.
    pub source: ActionSource,
    /// Raw search pattern.
    pub pattern: String,
}

/// Mutation facade binding one producer to the state machine.
///
/// Obtained from [`SelectionStateMachine::actionner`]; call sites cannot
/// mislabel their own origin.
pub struct Actionner<'a> {
    source: ActionSource,
    machine: &'a mut SelectionStateMachine,
}

impl<'a> Actionner<'a> {
    pub(crate) fn new(source: ActionSource, machine: &'a mut SelectionStateMachine) -> Self {
        Self { source, machine }
    }

    /// The producer this facade is bound to.
    pub fn source(&self) -> ActionSource {
        self.source
    }

    /// Whether the most recent mutation in `state` was made through this
    /// producer. Subscribers call this before reacting to a snapshot.
    pub fn initiated(&self, state: &SelectionState) -> bool {
        state.last_action_source == Some(self.source)
    }

    /// Replace the whole selection.
    pub fn replace_selected(&mut self, ids: Vec<RegionId>) {
        self.machine.replace_selected(self.source, ids);
    }

    /// Add one region to the selection (it becomes the last selected).
    pub fn add_to_selection(&mut self, id: RegionId) {
        self.machine.add_to_selection(self.source, id);
    }

    /// Remove one region from the selection.
    pub fn unselect(&mut self, id: &str) {
        self.machine.unselect(self.source, id);
    }

    /// Clear the selection.
    pub fn unselect_all(&mut self) {
        self.machine.unselect_all(self.source);
    }

    /// Set the disclosure state of one tree node.
    pub fn set_expanded(&mut self, id: &str, expanded: bool) {
        self.machine.set_expanded(self.source, id, expanded, false);
    }

    /// Flip the disclosure state of one tree node.
    pub fn toggle_expanded(&mut self, id: &str) {
        self.machine.toggle_expanded(self.source, id);
    }

    /// Expand or collapse a whole subtree, notifying listeners once.
    pub fn expand_collapse_subtree(&mut self, id: &str, expanded: bool) {
        self.machine.expand_collapse_subtree(self.source, id, expanded);
    }

    /// Apply a search highlight synchronously.
    pub fn highlight_by_name(&mut self, pattern: &str) {
        self.machine.highlight_by_name(self.source, pattern);
    }

    /// Queue a search highlight behind the typing debounce.
    ///
    /// The actual catalogue scan happens when the host loop polls the
    /// scheduler and feeds the due request back through
    /// [`SelectionStateMachine::apply_highlight_request`].
    pub fn queue_highlight_by_name(
        &mut self,
        scheduler: &mut TaskScheduler<HighlightRequest>,
        now: Instant,
        pattern: &str,
    ) {
        scheduler.schedule(
            SEARCH_SLOT,
            SEARCH_DEBOUNCE,
            now,
            HighlightRequest {
                source: self.source,
                pattern: pattern.to_string(),
            },
        );
    }

    /// Highlight every region of a grouping scheme (or clear when
    /// `active` is false).
    pub fn highlight_by_grouping(&mut self, scheme: &str, active: bool) {
        self.machine.highlight_by_grouping(self.source, scheme, active);
    }

    /// Replace the highlight with an explicit region set.
    pub fn highlight_region_set(&mut self, ids: &[RegionId]) {
        self.machine.highlight_region_set(self.source, ids);
    }

    /// Toggle the "regions in current slice" auto-highlight. Returns the
    /// new state.
    pub fn toggle_auto_highlighting(&mut self) -> bool {
        self.machine.toggle_auto_highlighting(self.source)
    }
}
