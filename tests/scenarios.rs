//! Cross-module scenarios: catalogue, selection, viewport, overlay and
//! edit engine working against each other through the public API.

use std::rc::Rc;

use atlasview::{
    ActionSource, NavState, OverlaySynchronizer, Plane, RegionCatalogue, RegionEditEngine,
    SelectionStateMachine, ViewerConfig, ViewportCoordinator,
};

const CATALOGUE_JSON: &str = r#"{
    "regions": [
        { "abb": "root", "name": "Whole brain", "color": [255, 255, 255] },
        { "abb": "A", "parent": "root", "name": "Forebrain", "color": [200, 40, 40] },
        { "abb": "A1", "parent": "A", "name": "Cortex", "color": [220, 80, 80],
          "centerSlices": { "axial": 3, "coronal": 12 } },
        { "abb": "B", "parent": "root", "name": "Hindbrain", "color": [40, 40, 200] },
        { "abb": "B1", "parent": "B", "name": "Cerebellum", "color": [80, 80, 220],
          "centerSlice": 7 }
    ]
}"#;

const CONFIG_JSON: &str = r#"{
    "image_size": 1000,
    "data_root_path": "/data/atlas",
    "layer": "nissl",
    "backend": { "protocol": "file" },
    "planes": [
        { "slide_count": 10, "slide_step": 2.0 },
        { "slide_count": 20 },
        { "slide_count": 0, "enabled": false }
    ]
}"#;

const SLICE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
    <path id="background" d="M 0 0 L 1000 0 L 1000 1000 L 0 1000 Z"/>
    <path id="A1_L" d="M 10 10 L 60 10 L 60 60 L 10 60 Z"/>
    <path id="B1" d="M 500 500 L 600 500 L 600 600 L 500 600 Z"/>
</svg>"#;

fn setup() -> (Rc<ViewerConfig>, Rc<RegionCatalogue>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = Rc::new(ViewerConfig::from_json(CONFIG_JSON).unwrap());
    let catalogue = Rc::new(RegionCatalogue::from_json(CATALOGUE_JSON).unwrap());
    (config, catalogue)
}

#[test]
fn viewer_click_flows_into_tree_disclosure() {
    let (config, catalogue) = setup();
    let mut machine = SelectionStateMachine::new();
    machine.attach_catalogue(Rc::clone(&catalogue));
    let mut overlay = OverlaySynchronizer::new(Rc::clone(&catalogue), &config);

    let ticket = overlay.request_slice(Plane::Coronal, 12);
    assert!(overlay.complete_fetch(&ticket, SLICE_SVG).unwrap());

    overlay.click_path(&mut machine, "A1_L", false);
    assert_eq!(machine.state().selected, vec!["A1"]);
    // The click discloses the clicked region's ancestry in the tree.
    assert!(machine.is_expanded("root"));
    assert!(machine.is_expanded("A"));
    assert!(!machine.is_expanded("B"));
    // Subscribers bound to the viewer source can recognize their own
    // mutation and skip reacting to it.
    assert_eq!(machine.state().last_action_source, Some(ActionSource::Viewer));
    let snapshot = machine.state().clone();
    assert!(machine.actionner(ActionSource::Viewer).initiated(&snapshot));
    assert!(!machine.actionner(ActionSource::Tree).initiated(&snapshot));
}

#[test]
fn slice_navigation_reloads_overlay_and_feeds_auto_highlight() {
    let (config, catalogue) = setup();
    let mut machine = SelectionStateMachine::new();
    machine.attach_catalogue(Rc::clone(&catalogue));
    let mut overlay = OverlaySynchronizer::new(Rc::clone(&catalogue), &config);
    let mut viewport = ViewportCoordinator::new(Rc::clone(&config));

    viewport.go_to_region(catalogue.region("A1").unwrap());
    assert_eq!(viewport.state().active_plane, Plane::Axial);
    assert_eq!(viewport.state().active_slice(), 3);
    assert_eq!(viewport.take_page_request(), Some(3));

    // The host reacts to the page change by fetching the slice overlay.
    let ticket = overlay.request_slice(
        viewport.state().active_plane,
        viewport.state().active_slice(),
    );
    assert!(overlay.complete_fetch(&ticket, SLICE_SVG).unwrap());
    // Deferred centering resolves once the overlay reports loaded.
    assert_eq!(viewport.overlay_loaded(), Some(vec!["A1".to_string()]));

    // Auto-highlight mode tracks the regions of the loaded slice.
    machine.actionner(ActionSource::Viewer).toggle_auto_highlighting();
    let present = overlay.regions_in_slice();
    machine
        .actionner(ActionSource::Viewer)
        .highlight_region_set(&present);
    assert_eq!(machine.highlight_status("A1").code(), "H");
    assert_eq!(machine.highlight_status("B").code(), "F");
}

#[test]
fn navigation_url_replays_across_instances() {
    let (config, _) = setup();
    let mut viewport = ViewportCoordinator::new(Rc::clone(&config));
    viewport.go_to_plane_slice(Plane::Coronal, 12, None);
    viewport.set_edit_mode(true);
    let url = viewport.current_nav_state().encode();

    let mut restored = ViewportCoordinator::new(Rc::clone(&config));
    restored.apply_nav_state(&NavState::decode(&url, &config));
    assert_eq!(restored.state().active_plane, Plane::Coronal);
    assert_eq!(restored.state().active_slice(), 12);
    assert!(restored.state().edit_mode);
    // Replay never records new history steps.
    assert!(restored.history_steps().is_empty());
}

#[test]
fn committed_edit_lands_back_in_the_overlay() {
    let (config, catalogue) = setup();
    let mut overlay = OverlaySynchronizer::new(Rc::clone(&catalogue), &config);
    let ticket = overlay.request_slice(Plane::Coronal, 12);
    overlay.complete_fetch(&ticket, SLICE_SVG).unwrap();

    let mut engine = RegionEditEngine::new();
    let outline = overlay.entry("B1").unwrap().d.clone();
    engine.start("B1", &outline).unwrap();
    engine.pointer_down(600.0, 550.0);
    engine.pointer_move(620.0, 550.0);
    engine.pointer_up();

    let committed = engine.stop().unwrap();
    assert_eq!(committed.path_id, "B1");
    assert!(overlay.apply_edit(&committed.path_id, &committed.d));
    // The grown outline reaches past the original right edge.
    let bbox = overlay.entry("B1").unwrap().bbox.unwrap();
    assert!(bbox.x + bbox.width > 600.0);
}

#[test]
fn stale_overlay_fetch_never_clobbers_newer_slice() {
    let (config, catalogue) = setup();
    let mut overlay = OverlaySynchronizer::new(Rc::clone(&catalogue), &config);
    let slow = overlay.request_slice(Plane::Axial, 3);
    let fast = overlay.request_slice(Plane::Axial, 4);
    assert!(overlay.complete_fetch(&fast, SLICE_SVG).unwrap());
    assert!(!overlay.complete_fetch(&slow, SLICE_SVG).unwrap());
    assert!(overlay.is_loaded());
    assert_eq!(overlay.regions_in_slice(), vec!["A1", "B1"]);
}
