//! Selection, disclosure and highlighting state over the region catalogue.
//!
//! One state machine owns the current selection, the tree
//! expand/collapse map and the highlight/filter sets. Producers mutate
//! it through an [`Actionner`] bound to their [`ActionSource`]; the
//! source of the most recent mutation is part of the state snapshot, so
//! listeners can skip reacting to their own changes.
//!
//! All mutation is synchronous and single-threaded; absence of data is
//! "not ready" (see [`SelectionStateMachine::is_ready`]), never a panic.

mod actionner;

pub use actionner::{
    ActionSource, Actionner, HighlightRequest, SEARCH_DEBOUNCE, SEARCH_SLOT,
};

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::catalogue::RegionCatalogue;
use crate::model::{HighlightStatus, RegionId};

/// Identifier of a registered listener.
pub type ListenerId = u64;

type ListenerFn = Box<dyn FnMut(&SelectionState)>;

/// Snapshot of the selection machine's state, handed to listeners on
/// every mutation. Consumers diff it themselves when they need
/// fine-grained change detection.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    /// Selected region ids; insertion order is the recency order, so the
    /// last element is the "last selected" region.
    pub selected: Vec<RegionId>,
    /// Direct matches of the active highlight.
    pub highlighted: HashSet<RegionId>,
    /// Ancestors needed to keep highlighted nodes connected to the root.
    /// Disjoint from `highlighted` by construction.
    pub filtered: HashSet<RegionId>,
    /// Tree disclosure per region. Holds an entry for every region
    /// whenever highlighting is inactive.
    pub expanded: HashMap<RegionId, bool>,
    /// Whether a highlight (search, grouping or slice set) is active.
    pub highlighting_active: bool,
    /// Gate preventing other producers from silently clearing a pinned
    /// highlight.
    pub highlighting_locked: bool,
    /// Whether the highlight tracks the regions of the current slice.
    pub auto_highlighting: bool,
    /// Producer of the most recent mutation; the anti-feedback-loop token.
    pub last_action_source: Option<ActionSource>,
}

impl SelectionState {
    /// The most recently selected region.
    pub fn last_selected(&self) -> Option<&str> {
        self.selected.last().map(String::as_str)
    }

    /// Whether a region is currently selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }
}

/// The selection state machine.
pub struct SelectionStateMachine {
    catalogue: Option<Rc<RegionCatalogue>>,
    state: SelectionState,
    listeners: Vec<(ListenerId, ListenerFn)>,
    next_listener: ListenerId,
}

impl Default for SelectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStateMachine {
    /// Create a machine with no catalogue attached (not ready).
    pub fn new() -> Self {
        Self {
            catalogue: None,
            state: SelectionState::default(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Attach the loaded catalogue. Initializes the disclosure map with
    /// an entry for every region (root expanded) and notifies listeners.
    pub fn attach_catalogue(&mut self, catalogue: Rc<RegionCatalogue>) {
        self.state.expanded = catalogue
            .ids()
            .map(|id| (id.to_string(), id == catalogue.root_id()))
            .collect();
        self.catalogue = Some(catalogue);
        self.notify();
    }

    /// Whether a catalogue is attached. Callers must check this before
    /// relying on tree-shaped answers; an unready machine answers every
    /// query with its falsy default and ignores mutations.
    pub fn is_ready(&self) -> bool {
        self.catalogue.is_some()
    }

    /// Current state snapshot.
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Obtain the mutation facade for one producer.
    pub fn actionner(&mut self, source: ActionSource) -> Actionner<'_> {
        Actionner::new(source, self)
    }

    /// Register a listener; it receives the full state snapshot on every
    /// mutation.
    pub fn add_listener(&mut self, listener: impl FnMut(&SelectionState) + 'static) -> ListenerId {
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
    // Selection
    // ------------------------------------------------------------------

    /// Replace the whole selection.
    pub fn replace_selected(&mut self, source: ActionSource, ids: Vec<RegionId>) {
        if !self.is_ready() {
            return;
        }
        log::debug!("{:?}: select {:?}", source, ids);
        self.state.selected = ids;
        self.after_selection_change(source);
    }

    /// Append one region to the selection; it becomes the last selected.
    /// Re-selecting an already selected region moves it to the end.
    pub fn add_to_selection(&mut self, source: ActionSource, id: RegionId) {
        if !self.is_ready() {
            return;
        }
        self.state.selected.retain(|s| *s != id);
        self.state.selected.push(id);
        self.after_selection_change(source);
    }

    /// Remove one region from the selection.
    pub fn unselect(&mut self, source: ActionSource, id: &str) {
        if !self.is_ready() {
            return;
        }
        self.state.selected.retain(|s| s != id);
        self.after_selection_change(source);
    }

    /// Clear the selection.
    pub fn unselect_all(&mut self, source: ActionSource) {
        if !self.is_ready() {
            return;
        }
        self.state.selected.clear();
        self.after_selection_change(source);
    }

    /// Disclosure bookkeeping shared by every selection mutation.
    ///
    /// A producer switch (a different subsystem taking over, with
    /// highlighting unlocked) clears the highlight and collapses the
    /// whole tree before disclosing the new selection's ancestry; this
    /// keeps the tree from accumulating stale disclosure across
    /// contexts. Repeated actions from the same producer keep existing
    /// disclosure and only add the new trail.
    fn after_selection_change(&mut self, source: ActionSource) {
        let switched = self.state.last_action_source != Some(source);
        if switched && !self.state.highlighting_locked {
            self.clear_highlighting_silent();
            self.collapse_all_silent();
        }
        if let Some(last) = self.state.selected.last().cloned() {
            self.expand_trail_silent(&last);
        }
        self.state.last_action_source = Some(source);
        self.notify();
    }

    /// Expand every ancestor of a region (not the region itself, not its
    /// descendants).
    fn expand_trail_silent(&mut self, id: &str) {
        let Some(catalogue) = self.catalogue.as_ref() else {
            return;
        };
        let Some(region) = catalogue.region(id) else {
            return;
        };
        for ancestor in region.trail.clone() {
            self.state.expanded.insert(ancestor, true);
        }
    }

    fn collapse_all_silent(&mut self) {
        for flag in self.state.expanded.values_mut() {
            *flag = false;
        }
    }

    fn expand_all_silent(&mut self) {
        if let Some(catalogue) = self.catalogue.as_ref() {
            for id in catalogue.ids() {
                self.state.expanded.insert(id.to_string(), true);
            }
        }
    }

    // ------------------------------------------------------------------
    // Disclosure
    // ------------------------------------------------------------------

    /// Whether a tree node is disclosed.
    pub fn is_expanded(&self, id: &str) -> bool {
        self.state.expanded.get(id).copied().unwrap_or(false)
    }

    /// Set the disclosure state of one node. `silent` suppresses the
    /// listener notification (used by bulk operations).
    pub fn set_expanded(&mut self, source: ActionSource, id: &str, expanded: bool, silent: bool) {
        if !self.is_ready() {
            return;
        }
        self.state.expanded.insert(id.to_string(), expanded);
        if !silent {
            self.state.last_action_source = Some(source);
            self.notify();
        }
    }

    /// Flip the disclosure state of one node.
    pub fn toggle_expanded(&mut self, source: ActionSource, id: &str) {
        let expanded = self.is_expanded(id);
        self.set_expanded(source, id, !expanded, false);
    }

    /// Expand or collapse a node and all its descendants.
    ///
    /// Descendants are applied before the node itself, all silently;
    /// listeners are notified exactly once per user-visible call.
    pub fn expand_collapse_subtree(&mut self, source: ActionSource, id: &str, expanded: bool) {
        if !self.is_ready() {
            return;
        }
        let descendants = self.collect_descendants(id);
        for descendant in descendants {
            self.set_expanded(source, &descendant, expanded, true);
        }
        self.set_expanded(source, id, expanded, false);
    }

    /// All descendants of a region, depth-first, via an explicit stack.
    fn collect_descendants(&self, id: &str) -> Vec<RegionId> {
        let Some(catalogue) = self.catalogue.as_ref() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack: Vec<RegionId> = catalogue
            .region(id)
            .map(|r| r.children.clone())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            if let Some(region) = catalogue.region(&current) {
                stack.extend(region.children.iter().cloned());
            }
            out.push(current);
        }
        out
    }

    // ------------------------------------------------------------------
    // Highlighting
    // ------------------------------------------------------------------

    /// Case-insensitive substring search against region names and
    /// abbreviations.
    ///
    /// Matches become `highlighted`; every ancestor needed to keep a
    /// match connected to the root becomes `filtered`; the whole tree is
    /// force-expanded so matches are visible regardless of prior
    /// disclosure. An empty pattern clears the highlight. No-op while
    /// the highlight is locked.
    ///
    /// The scan itself is synchronous; debouncing of continuous typing
    /// is the caller's job (see [`Actionner::queue_highlight_by_name`]).
    pub fn highlight_by_name(&mut self, source: ActionSource, pattern: &str) {
        if !self.is_ready() {
            return;
        }
        if self.state.highlighting_locked {
            log::debug!("highlight_by_name ignored: highlighting is locked");
            return;
        }
        if pattern.is_empty() {
            self.clear_highlighting_silent();
            self.state.last_action_source = Some(source);
            self.notify();
            return;
        }
        let upper = pattern.to_uppercase();
        let catalogue = self.catalogue.as_ref().expect("checked is_ready");
        let highlighted: HashSet<RegionId> = catalogue
            .regions()
            .filter(|r| r.matches_upper(&upper))
            .map(|r| r.abb.clone())
            .collect();
        self.apply_highlight_sets(highlighted);
        self.expand_all_silent();
        self.state.last_action_source = Some(source);
        self.notify();
    }

    /// Apply a previously queued debounced search request.
    pub fn apply_highlight_request(&mut self, request: HighlightRequest) {
        self.highlight_by_name(request.source, &request.pattern);
    }

    /// Highlight every region belonging to a grouping scheme, or clear
    /// the highlight when `active` is false.
    ///
    /// Activation unlocks first (a fresh grouping replaces any pinned
    /// highlight); pinning the result is an explicit follow-up call to
    /// [`SelectionStateMachine::set_highlighting_locked`].
    pub fn highlight_by_grouping(&mut self, source: ActionSource, scheme: &str, active: bool) {
        if !self.is_ready() {
            return;
        }
        self.state.highlighting_locked = false;
        if active {
            let members = self
                .catalogue
                .as_ref()
                .expect("checked is_ready")
                .members_of_scheme(scheme);
            self.apply_highlight_sets(members.into_iter().collect());
            self.expand_all_silent();
        } else {
            self.clear_highlighting_silent();
        }
        self.state.last_action_source = Some(source);
        self.notify();
    }

    /// Replace the highlight with an explicit region set, preserving the
    /// lock flag. This is the feed for "regions in current slice"
    /// auto-highlighting.
    pub fn highlight_region_set(&mut self, source: ActionSource, ids: &[RegionId]) {
        if !self.is_ready() {
            return;
        }
        self.apply_highlight_sets(ids.iter().cloned().collect());
        self.state.last_action_source = Some(source);
        self.notify();
    }

    /// Toggle highlight-regions-in-current-slice mode. Enabling locks
    /// the highlight; disabling clears and unlocks it. Returns the new
    /// state.
    pub fn toggle_auto_highlighting(&mut self, source: ActionSource) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.state.auto_highlighting = !self.state.auto_highlighting;
        if self.state.auto_highlighting {
            self.state.highlighting_locked = true;
        } else {
            self.clear_highlighting_silent();
            self.state.highlighting_locked = false;
        }
        self.state.last_action_source = Some(source);
        self.notify();
        self.state.auto_highlighting
    }

    /// Pin or unpin the current highlight.
    pub fn set_highlighting_locked(&mut self, locked: bool) {
        self.state.highlighting_locked = locked;
    }

    /// Display status of a region under the current highlight.
    pub fn highlight_status(&self, id: &str) -> HighlightStatus {
        if !self.state.highlighting_active {
            HighlightStatus::Off
        } else if self.state.highlighted.contains(id) {
            HighlightStatus::Highlighted
        } else if self.state.filtered.contains(id) {
            HighlightStatus::Filtered
        } else {
            HighlightStatus::Dimmed
        }
    }

    /// Whether a node is the last of its parent's children that the tree
    /// actually shows, accounting for highlighting-driven pruning: a
    /// sibling counts as "last" when every sibling after it is neither
    /// highlighted nor filtered. Drives the tree's connecting lines.
    pub fn is_last_visible_child(&self, id: &str) -> bool {
        let Some(catalogue) = self.catalogue.as_ref() else {
            return false;
        };
        let Some(region) = catalogue.region(id) else {
            return false;
        };
        let Some(parent) = region.parent.as_deref().and_then(|p| catalogue.region(p)) else {
            return true;
        };
        let Some(position) = parent.children.iter().position(|c| c == id) else {
            return true;
        };
        parent.children[position + 1..].iter().all(|sibling| {
            if self.state.highlighting_active {
                !self.state.highlighted.contains(sibling)
                    && !self.state.filtered.contains(sibling)
            } else {
                false
            }
        })
    }

    /// Install `highlighted` and derive the disjoint `filtered` ancestor
    /// set from the trails.
    fn apply_highlight_sets(&mut self, highlighted: HashSet<RegionId>) {
        let mut filtered = HashSet::new();
        if let Some(catalogue) = self.catalogue.as_ref() {
            for id in &highlighted {
                if let Some(region) = catalogue.region(id) {
                    for ancestor in &region.trail {
                        if !highlighted.contains(ancestor) {
                            filtered.insert(ancestor.clone());
                        }
                    }
                }
            }
        }
        self.state.highlighted = highlighted;
        self.state.filtered = filtered;
        self.state.highlighting_active = true;
    }

    fn clear_highlighting_silent(&mut self) {
        self.state.highlighted.clear();
        self.state.filtered.clear();
        self.state.highlighting_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::tests::test_catalogue;
    use std::cell::Cell;

    fn machine() -> SelectionStateMachine {
        let mut machine = SelectionStateMachine::new();
        machine.attach_catalogue(Rc::new(test_catalogue()));
        machine
    }

    #[test]
    fn test_unready_machine_ignores_mutations() {
        let mut machine = SelectionStateMachine::new();
        assert!(!machine.is_ready());
        machine.replace_selected(ActionSource::Tree, vec!["A1".to_string()]);
        assert!(machine.state().selected.is_empty());
        assert!(!machine.is_expanded("root"));
    }

    #[test]
    fn test_select_expands_trail_only() {
        let mut machine = machine();
        machine
            .actionner(ActionSource::Tree)
            .replace_selected(vec!["A1".to_string()]);
        assert!(machine.is_expanded("root"));
        assert!(machine.is_expanded("A"));
        assert!(!machine.is_expanded("B"));
        // The selected node itself is disclosed by its ancestors, not
        // expanded.
        assert!(!machine.is_expanded("A1"));
    }

    #[test]
    fn test_trail_invariant_for_every_region() {
        let catalogue = test_catalogue();
        for id in ["A", "A1", "A2", "B", "B1"] {
            let mut machine = SelectionStateMachine::new();
            machine.attach_catalogue(Rc::new(test_catalogue()));
            machine
                .actionner(ActionSource::External)
                .replace_selected(vec![id.to_string()]);
            for ancestor in &catalogue.region(id).unwrap().trail {
                assert!(machine.is_expanded(ancestor), "{id}: {ancestor} not expanded");
            }
        }
    }

    #[test]
    fn test_same_source_preserves_disclosure() {
        let mut machine = machine();
        machine.set_expanded(ActionSource::Tree, "B", true, false);
        // Two sequential viewer selections keep the unrelated branch open.
        machine
            .actionner(ActionSource::Viewer)
            .add_to_selection("A1".to_string());
        assert!(!machine.is_expanded("B"));

        machine.set_expanded(ActionSource::Viewer, "B", true, false);
        machine
            .actionner(ActionSource::Viewer)
            .add_to_selection("A2".to_string());
        assert!(machine.is_expanded("B"));

        // A different producer taking over collapses the stale branch.
        machine
            .actionner(ActionSource::Tree)
            .add_to_selection("A1".to_string());
        assert!(!machine.is_expanded("B"));
    }

    #[test]
    fn test_add_to_selection_recency_order() {
        let mut machine = machine();
        let mut viewer = machine.actionner(ActionSource::Viewer);
        viewer.add_to_selection("A1".to_string());
        viewer.add_to_selection("B1".to_string());
        viewer.add_to_selection("A1".to_string());
        assert_eq!(machine.state().selected, vec!["B1", "A1"]);
        assert_eq!(machine.state().last_selected(), Some("A1"));
    }

    #[test]
    fn test_unselect_and_unselect_all() {
        let mut machine = machine();
        machine
            .actionner(ActionSource::Viewer)
            .replace_selected(vec!["A1".to_string(), "B1".to_string()]);
        machine.actionner(ActionSource::Viewer).unselect("A1");
        assert_eq!(machine.state().selected, vec!["B1"]);
        machine.actionner(ActionSource::Viewer).unselect_all();
        assert!(machine.state().selected.is_empty());
    }

    #[test]
    fn test_set_expanded_idempotent() {
        let mut machine = machine();
        machine.set_expanded(ActionSource::Tree, "A", true, false);
        let once = machine.state().clone();
        machine.set_expanded(ActionSource::Tree, "A", true, false);
        assert_eq!(machine.state().expanded, once.expanded);
    }

    #[test]
    fn test_subtree_notifies_once() {
        let count = Rc::new(Cell::new(0u32));
        let seen = Rc::clone(&count);
        let mut machine = machine();
        machine.add_listener(move |_| seen.set(seen.get() + 1));
        machine.expand_collapse_subtree(ActionSource::Tree, "root", true);
        assert_eq!(count.get(), 1);
        for id in ["root", "A", "A1", "A2", "B", "B1"] {
            assert!(machine.is_expanded(id), "{id} not expanded");
        }
    }

    #[test]
    fn test_highlight_by_name_status_codes() {
        let mut machine = machine();
        machine.actionner(ActionSource::Search).highlight_by_name("A1");
        assert_eq!(machine.highlight_status("A1"), HighlightStatus::Highlighted);
        assert_eq!(machine.highlight_status("A"), HighlightStatus::Filtered);
        assert_eq!(machine.highlight_status("B"), HighlightStatus::Dimmed);
        assert_eq!(machine.highlight_status("B").code(), "0");
        // The whole tree is force-expanded so matches are visible.
        assert!(machine.is_expanded("B"));
    }

    #[test]
    fn test_highlight_sets_disjoint() {
        let mut machine = machine();
        // "br" matches nested regions (root, A and B), so ancestors of
        // matches are themselves matches and must not land in filtered.
        machine.actionner(ActionSource::Search).highlight_by_name("br");
        let state = machine.state();
        assert!(state.highlighted.is_disjoint(&state.filtered));

        machine
            .actionner(ActionSource::Tree)
            .highlight_by_grouping("systems", true);
        let state = machine.state();
        assert!(state.highlighted.is_disjoint(&state.filtered));
    }

    #[test]
    fn test_empty_pattern_clears_highlight() {
        let mut machine = machine();
        machine.actionner(ActionSource::Search).highlight_by_name("A1");
        assert!(machine.state().highlighting_active);
        machine.actionner(ActionSource::Search).highlight_by_name("");
        assert!(!machine.state().highlighting_active);
        assert_eq!(machine.highlight_status("A1"), HighlightStatus::Off);
        assert_eq!(machine.highlight_status("A1").code(), "no");
    }

    #[test]
    fn test_auto_highlighting_disable_reopens_search() {
        let mut machine = machine();
        machine.actionner(ActionSource::Viewer).toggle_auto_highlighting();
        machine
            .actionner(ActionSource::Viewer)
            .highlight_region_set(&["A1".to_string()]);
        machine.actionner(ActionSource::Viewer).toggle_auto_highlighting();
        // With the lock released, search highlighting works again.
        machine.actionner(ActionSource::Search).highlight_by_name("B1");
        assert_eq!(machine.highlight_status("B1"), HighlightStatus::Highlighted);
    }

    #[test]
    fn test_expanded_covers_catalogue_after_highlight_clears() {
        let mut machine = machine();
        machine.actionner(ActionSource::Search).highlight_by_name("br");
        machine.actionner(ActionSource::Search).highlight_by_name("");
        assert!(!machine.state().highlighting_active);
        // With highlighting off, every region keeps a disclosure entry.
        for id in ["root", "A", "A1", "A2", "B", "B1"] {
            assert!(
                machine.state().expanded.contains_key(id),
                "{id} missing from expanded"
            );
        }
    }

    #[test]
    fn test_locked_highlight_resists_search_and_selection() {
        let mut machine = machine();
        machine
            .actionner(ActionSource::Tree)
            .highlight_by_grouping("systems", true);
        machine.set_highlighting_locked(true);

        machine.actionner(ActionSource::Search).highlight_by_name("B1");
        assert_eq!(machine.highlight_status("A1"), HighlightStatus::Highlighted);

        // A producer switch normally clears highlighting; the lock gates it.
        machine
            .actionner(ActionSource::Viewer)
            .add_to_selection("B1".to_string());
        assert!(machine.state().highlighting_active);
        assert_eq!(machine.highlight_status("A1"), HighlightStatus::Highlighted);
    }

    #[test]
    fn test_grouping_deactivation_unlocks_and_clears() {
        let mut machine = machine();
        machine
            .actionner(ActionSource::Tree)
            .highlight_by_grouping("systems", true);
        machine.set_highlighting_locked(true);
        machine
            .actionner(ActionSource::Tree)
            .highlight_by_grouping("systems", false);
        assert!(!machine.state().highlighting_active);
        assert!(!machine.state().highlighting_locked);
    }

    #[test]
    fn test_auto_highlighting_toggle() {
        let mut machine = machine();
        assert!(machine.actionner(ActionSource::Viewer).toggle_auto_highlighting());
        assert!(machine.state().highlighting_locked);

        machine
            .actionner(ActionSource::Viewer)
            .highlight_region_set(&["A1".to_string(), "B1".to_string()]);
        assert_eq!(machine.highlight_status("A1"), HighlightStatus::Highlighted);
        assert_eq!(machine.highlight_status("B"), HighlightStatus::Filtered);

        assert!(!machine.actionner(ActionSource::Viewer).toggle_auto_highlighting());
        assert!(!machine.state().highlighting_active);
        assert!(!machine.state().highlighting_locked);
    }

    #[test]
    fn test_is_last_visible_child_without_highlight() {
        let machine = machine();
        assert!(!machine.is_last_visible_child("A"));
        assert!(machine.is_last_visible_child("B"));
        assert!(!machine.is_last_visible_child("A1"));
        assert!(machine.is_last_visible_child("A2"));
        assert!(machine.is_last_visible_child("root"));
    }

    #[test]
    fn test_is_last_visible_child_with_highlight_pruning() {
        let mut machine = machine();
        // Only A1 matches: B is pruned from the tree, so A becomes the
        // last visible child of root.
        machine.actionner(ActionSource::Search).highlight_by_name("Cortex");
        assert!(machine.is_last_visible_child("A"));
        assert!(machine.is_last_visible_child("A1"));
    }

    #[test]
    fn test_listener_receives_source_token() {
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        let mut machine = machine();
        machine.add_listener(move |state| sink.set(state.last_action_source));
        machine
            .actionner(ActionSource::Viewer)
            .add_to_selection("A1".to_string());
        assert_eq!(seen.get(), Some(ActionSource::Viewer));
    }

    #[test]
    fn test_remove_listener() {
        let count = Rc::new(Cell::new(0u32));
        let sink = Rc::clone(&count);
        let mut machine = machine();
        let id = machine.add_listener(move |_| sink.set(sink.get() + 1));
        machine
            .actionner(ActionSource::Tree)
            .add_to_selection("A1".to_string());
        machine.remove_listener(id);
        machine
            .actionner(ActionSource::Tree)
            .add_to_selection("A2".to_string());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_debounced_highlight_request() {
        use crate::scheduler::TaskScheduler;
        use web_time::Instant;

        let now = Instant::now();
        let mut scheduler = TaskScheduler::new();
        let mut machine = machine();
        let mut search = machine.actionner(ActionSource::Search);
        search.queue_highlight_by_name(&mut scheduler, now, "Cort");
        search.queue_highlight_by_name(&mut scheduler, now, "Cortex");

        // Nothing applied until the quiet period elapses.
        assert!(!machine.state().highlighting_active);
        for request in scheduler.poll(now + SEARCH_DEBOUNCE) {
            machine.apply_highlight_request(request);
        }
        assert_eq!(machine.highlight_status("A1"), HighlightStatus::Highlighted);
    }
}
