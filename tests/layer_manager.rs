use std::cell::RefCell;
use std::rc::Rc;

use image::Rgba;
use strata::events::{EditorEvent, EventBus, EventKind};
use strata::{BlendMode, EditorError, LayerManager};

/// Background plus `extra` transparent layers named "Layer 1", "Layer 2", …
fn stack_with(extra: usize) -> LayerManager {
    let mut mgr = LayerManager::new(16, 16).unwrap();
    for i in 1..=extra {
        mgr.create_layer(&format!("Layer {}", i)).unwrap();
    }
    mgr
}

fn names(mgr: &LayerManager) -> Vec<String> {
    (0..mgr.layer_count())
        .map(|i| mgr.layer(i).unwrap().name.clone())
        .collect()
}

#[test]
fn new_manager_has_white_background() {
    let mgr = LayerManager::new(8, 8).unwrap();
    assert_eq!(mgr.layer_count(), 1);
    assert_eq!(mgr.active_index(), 0);
    assert_eq!(mgr.active_layer().name, "Background");
    assert_eq!(
        mgr.active_layer().surface().pixel(4, 4),
        Rgba([255, 255, 255, 255])
    );
}

#[test]
fn create_layer_appends_on_top() {
    let mut mgr = stack_with(0);
    let index = mgr.create_layer("Sketch").unwrap();
    assert_eq!(index, 1);
    assert_eq!(names(&mgr), ["Background", "Sketch"]);
    // New layers are transparent
    assert_eq!(mgr.layer(1).unwrap().surface().pixel(0, 0), Rgba([0; 4]));
}

#[test]
fn delete_last_remaining_layer_is_rejected() {
    let mut mgr = stack_with(0);
    assert!(matches!(mgr.delete_layer(0), Err(EditorError::LastLayer)));
    assert_eq!(mgr.layer_count(), 1);
}

#[test]
fn delete_layer_adjusts_active_index() {
    // active above the deleted index shifts down
    let mut mgr = stack_with(2);
    mgr.set_active_layer(2).unwrap();
    mgr.delete_layer(1).unwrap();
    assert_eq!(mgr.active_index(), 1);
    assert_eq!(mgr.active_layer().name, "Layer 2");

    // deleting the active layer activates its lower neighbor
    let mut mgr = stack_with(2);
    mgr.set_active_layer(1).unwrap();
    mgr.delete_layer(1).unwrap();
    assert_eq!(mgr.active_index(), 0);

    // active below the deleted index is untouched
    let mut mgr = stack_with(2);
    mgr.set_active_layer(0).unwrap();
    mgr.delete_layer(2).unwrap();
    assert_eq!(mgr.active_index(), 0);
}

#[test]
fn move_layer_round_trip_restores_order() {
    let mut mgr = stack_with(3);
    let before = names(&mgr);
    mgr.move_layer(1, 3).unwrap();
    assert_ne!(names(&mgr), before);
    mgr.move_layer(3, 1).unwrap();
    assert_eq!(names(&mgr), before);
}

#[test]
fn move_layer_tracks_active_index() {
    // the moved layer stays active
    let mut mgr = stack_with(3);
    mgr.set_active_layer(1).unwrap();
    mgr.move_layer(1, 3).unwrap();
    assert_eq!(mgr.active_index(), 3);
    assert_eq!(mgr.active_layer().name, "Layer 1");

    // moving a layer across the active one shifts it by one
    let mut mgr = stack_with(3);
    mgr.set_active_layer(2).unwrap();
    mgr.move_layer(1, 3).unwrap();
    assert_eq!(mgr.active_index(), 1);
    assert_eq!(mgr.active_layer().name, "Layer 2");

    let mut mgr = stack_with(3);
    mgr.set_active_layer(2).unwrap();
    mgr.move_layer(3, 1).unwrap();
    assert_eq!(mgr.active_index(), 3);
    assert_eq!(mgr.active_layer().name, "Layer 2");
}

#[test]
fn move_layer_rejects_equal_or_invalid_indices() {
    let mut mgr = stack_with(2);
    assert!(matches!(
        mgr.move_layer(1, 1),
        Err(EditorError::InvalidMove { .. })
    ));
    assert!(matches!(
        mgr.move_layer(0, 9),
        Err(EditorError::LayerIndexOutOfRange { .. })
    ));
    assert_eq!(names(&mgr), ["Background", "Layer 1", "Layer 2"]);
}

#[test]
fn duplicate_inserts_copy_after_source() {
    let mut mgr = stack_with(0);
    mgr.create_layer("A").unwrap();
    mgr.create_layer("B").unwrap();

    let new_index = mgr.duplicate_layer(1).unwrap();
    assert_eq!(new_index, 2);
    assert_eq!(names(&mgr), ["Background", "A", "A Copy", "B"]);
}

#[test]
fn duplicate_copies_pixels_and_properties() {
    let mut mgr = stack_with(1);
    mgr.layer_mut(1)
        .unwrap()
        .surface_mut()
        .begin_drawing()
        .put_pixel(3, 3, Rgba([10, 20, 30, 40]));
    mgr.set_layer_opacity(1, 0.5).unwrap();
    mgr.set_layer_blend_mode(1, BlendMode::Multiply).unwrap();

    let copy_index = mgr.duplicate_layer(1).unwrap();
    let copy = mgr.layer(copy_index).unwrap();
    assert_eq!(copy.surface().pixel(3, 3), Rgba([10, 20, 30, 40]));
    assert_eq!(copy.opacity(), 0.5);
    assert_eq!(copy.blend_mode, BlendMode::Multiply);

    // deep copy: later edits to the source do not leak into the copy
    mgr.layer_mut(1)
        .unwrap()
        .surface_mut()
        .begin_drawing()
        .put_pixel(3, 3, Rgba([0; 4]));
    assert_eq!(
        mgr.layer(copy_index).unwrap().surface().pixel(3, 3),
        Rgba([10, 20, 30, 40])
    );
}

#[test]
fn hidden_layers_are_skipped_by_composite() {
    let mut mgr = stack_with(1);
    mgr.layer_mut(1)
        .unwrap()
        .surface_mut()
        .begin_drawing()
        .clear(Rgba([0, 0, 255, 255]));

    let flat = mgr.composite();
    assert_eq!(*flat.get_pixel(0, 0), Rgba([0, 0, 255, 255]));

    mgr.set_layer_visibility(1, false).unwrap();
    let flat = mgr.composite();
    assert_eq!(*flat.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
}

#[test]
fn composite_applies_layer_opacity() {
    let mut mgr = stack_with(1);
    mgr.layer_mut(1)
        .unwrap()
        .surface_mut()
        .begin_drawing()
        .clear(Rgba([0, 0, 0, 255]));
    mgr.set_layer_opacity(1, 0.5).unwrap();

    // Black at 50% over white lands mid-grey.
    let px = *mgr.composite().get_pixel(0, 0);
    assert_eq!(px[3], 255);
    assert!((126..=129).contains(&px[0]), "got {:?}", px);
}

#[test]
fn events_fire_for_structural_mutations() {
    let mut mgr = stack_with(0);
    let seen: Rc<RefCell<Vec<EditorEvent>>> = Rc::new(RefCell::new(Vec::new()));

    let sink = seen.clone();
    mgr.events().subscribe(EventKind::LayerCreated, move |e| {
        sink.borrow_mut().push(*e);
    });
    let sink = seen.clone();
    mgr.events().subscribe(EventKind::LayerDeleted, move |e| {
        sink.borrow_mut().push(*e);
    });

    mgr.create_layer("A").unwrap();
    mgr.create_layer("B").unwrap();
    mgr.delete_layer(1).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            EditorEvent::LayerCreated { index: 1 },
            EditorEvent::LayerCreated { index: 2 },
            EditorEvent::LayerDeleted { index: 1 },
        ]
    );
}

#[test]
fn handlers_may_subscribe_reentrantly_during_emit() {
    let bus = Rc::new(EventBus::new());
    let hits: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    // the outer handler registers another handler for the same kind while
    // its own emit is still being delivered
    let inner_bus = bus.clone();
    let outer_hits = hits.clone();
    bus.subscribe(EventKind::ImageSaved, move |_| {
        outer_hits.borrow_mut().push("outer");
        let inner_hits = outer_hits.clone();
        inner_bus.subscribe(EventKind::ImageSaved, move |_| {
            inner_hits.borrow_mut().push("inner");
        });
    });

    bus.emit(EditorEvent::ImageSaved);
    assert_eq!(*hits.borrow(), vec!["outer"]);

    // the re-entrantly added handler participates from the next emit
    bus.emit(EditorEvent::ImageSaved);
    assert_eq!(*hits.borrow(), vec!["outer", "outer", "inner"]);
}

#[test]
fn subscribers_run_in_subscription_order() {
    let mgr = stack_with(0);
    let order: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));

    let sink = order.clone();
    mgr.events()
        .subscribe(EventKind::ImageSaved, move |_| sink.borrow_mut().push(1));
    let sink = order.clone();
    mgr.events()
        .subscribe(EventKind::ImageSaved, move |_| sink.borrow_mut().push(2));

    mgr.events().emit(EditorEvent::ImageSaved);
    assert_eq!(*order.borrow(), vec![1, 2]);
}
