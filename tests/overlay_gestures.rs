use std::sync::Arc;

use egui::{Color32, Rect, pos2, vec2};
use parking_lot::Mutex;
use photo_markup::event::{EventHandler, LogEventHandler, OverlayEvent};
use photo_markup::gesture::{Gesture, GesturePhase};
use photo_markup::overlay::{
    GestureOutcome, OverlayId, OverlayObject, OverlayPayload, OverlayStage, TextPayload,
};
use photo_markup::transform::Placement;
use photo_markup::MarkupError;

// Collects events for inspection
struct EventRecorder(Arc<Mutex<Vec<OverlayEvent>>>);

impl EventHandler for EventRecorder {
    fn handle_event(&mut self, event: &OverlayEvent) {
        self.0.lock().push(event.clone());
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn text_overlay(text: &str, x: f32) -> OverlayObject {
    let payload = TextPayload::new(text, Color32::WHITE, Color32::BLACK, 30.0);
    let frame = Rect::from_min_size(pos2(x, 100.0), vec2(80.0, 60.0));
    OverlayObject::new(OverlayPayload::Text(payload), Placement::new(1.0, 0.0, frame), 15.0)
}

fn setup() -> (OverlayStage, OverlayId, OverlayId, Arc<Mutex<Vec<OverlayEvent>>>) {
    init_logger();
    let mut stage = OverlayStage::new(15.0);
    let first = stage.add(text_overlay("first", 0.0));
    let second = stage.add(text_overlay("second", 200.0));
    let events = Arc::new(Mutex::new(Vec::new()));
    stage.events().subscribe(Box::new(LogEventHandler));
    stage.events().subscribe(Box::new(EventRecorder(events.clone())));
    (stage, first, second, events)
}

fn pan(phase: GesturePhase, x: f32, y: f32) -> Gesture {
    Gesture::Pan {
        phase,
        translation: vec2(x, y),
        location: pos2(300.0 + x, 300.0 + y),
    }
}

#[test]
fn test_pan_lifecycle_notifies_host_and_freezes_siblings() {
    let (mut stage, first, second, events) = setup();

    let outcome = stage.handle_gesture(first, &pan(GesturePhase::Began, 0.0, 0.0)).unwrap();
    assert_eq!(outcome, GestureOutcome::Handled);
    assert_eq!(stage.ids().last(), Some(&first));
    assert!(!stage.get(second).unwrap().is_enabled());
    assert!(stage.get(first).unwrap().is_manipulating());

    stage.handle_gesture(first, &pan(GesturePhase::Changed, 10.0, 5.0)).unwrap();
    assert_eq!(stage.get(first).unwrap().transform().in_flight(), vec2(10.0, 5.0));

    // Disabled siblings ignore input silently
    let outcome = stage.handle_gesture(second, &pan(GesturePhase::Began, 0.0, 0.0)).unwrap();
    assert_eq!(outcome, GestureOutcome::Ignored);

    stage.handle_gesture(first, &pan(GesturePhase::Ended, 20.0, 10.0)).unwrap();
    let overlay = stage.get(first).unwrap();
    assert_eq!(overlay.transform().cumulative_translation(), vec2(20.0, 10.0));
    assert!(!overlay.is_manipulating());
    assert!(stage.get(second).unwrap().is_enabled());

    let events = events.lock();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], OverlayEvent::OperationBegin { id: first });
    assert!(matches!(
        events[1],
        OverlayEvent::OperationUpdate { id, over_drop_target: false, .. } if id == first
    ));
    assert!(matches!(
        events[2],
        OverlayEvent::OperationEnd { id, removed: false, .. } if id == first
    ));
}

#[test]
fn test_tap_requests_text_edit_and_moves_selection() {
    let (mut stage, first, second, events) = setup();

    stage.handle_gesture(first, &Gesture::Tap).unwrap();
    assert_eq!(stage.selected(), Some(first));

    stage.handle_gesture(second, &Gesture::Tap).unwrap();
    assert_eq!(stage.selected(), Some(second));
    assert!(!stage.get(first).unwrap().is_selected());

    let events = events.lock();
    assert_eq!(
        events[0],
        OverlayEvent::TextEditRequested {
            id: first,
            text: "first".to_string()
        }
    );
    assert_eq!(events[1], OverlayEvent::Tapped { id: first });
    assert_eq!(events.len(), 4);
}

#[test]
fn test_drop_on_target_removes_overlay() {
    let (mut stage, first, _second, events) = setup();
    stage.set_drop_target(Some(Rect::from_min_max(pos2(300.0, 380.0), pos2(400.0, 450.0))));

    stage.handle_gesture(first, &pan(GesturePhase::Began, 0.0, 0.0)).unwrap();
    stage.handle_gesture(first, &pan(GesturePhase::Changed, 50.0, 100.0)).unwrap();
    let outcome = stage.handle_gesture(first, &pan(GesturePhase::Ended, 50.0, 100.0)).unwrap();

    assert_eq!(outcome, GestureOutcome::Removed);
    assert!(stage.get(first).is_none());
    assert_eq!(stage.len(), 1);

    let events = events.lock();
    assert!(matches!(
        events[1],
        OverlayEvent::OperationUpdate { over_drop_target: true, .. }
    ));
    assert!(matches!(events[2], OverlayEvent::OperationEnd { removed: true, .. }));
}

#[test]
fn test_drop_uses_pan_location_when_rotation_ends_last() {
    let (mut stage, first, _second, events) = setup();
    stage.set_drop_target(Some(Rect::from_min_max(pos2(300.0, 380.0), pos2(400.0, 450.0))));
    let rotate = |phase, delta| Gesture::Rotate { phase, delta };

    stage.handle_gesture(first, &pan(GesturePhase::Began, 0.0, 0.0)).unwrap();
    stage.handle_gesture(first, &rotate(GesturePhase::Began, 0.2)).unwrap();
    // Finger lifts over the target while the rotation is still live
    stage.handle_gesture(first, &pan(GesturePhase::Ended, 50.0, 100.0)).unwrap();
    assert!(stage.get(first).unwrap().is_manipulating());

    let outcome = stage.handle_gesture(first, &rotate(GesturePhase::Ended, 0.0)).unwrap();
    assert_eq!(outcome, GestureOutcome::Removed);
    assert!(stage.get(first).is_none());

    let events = events.lock();
    assert_eq!(
        events.last(),
        Some(&OverlayEvent::OperationEnd {
            id: first,
            location: Some(pos2(350.0, 400.0)),
            removed: true,
        })
    );
}

#[test]
fn test_pan_location_does_not_leak_into_next_operation() {
    let (mut stage, first, _second, _events) = setup();
    stage.set_drop_target(Some(Rect::from_min_max(pos2(300.0, 380.0), pos2(400.0, 450.0))));

    stage.handle_gesture(first, &pan(GesturePhase::Began, 0.0, 0.0)).unwrap();
    stage.handle_gesture(first, &pan(GesturePhase::Ended, 50.0, 50.0)).unwrap();
    assert_eq!(stage.get(first).unwrap().pan_location(), Some(pos2(350.0, 350.0)));

    let pinch = |phase, factor| Gesture::Pinch { phase, factor };
    stage.handle_gesture(first, &pinch(GesturePhase::Began, 1.5)).unwrap();
    assert_eq!(stage.get(first).unwrap().pan_location(), None);
    let outcome = stage.handle_gesture(first, &pinch(GesturePhase::Ended, 1.0)).unwrap();
    assert_eq!(outcome, GestureOutcome::Handled);
}

#[test]
fn test_host_disabled_overlay_stays_disabled_after_operation() {
    let (mut stage, first, second, _events) = setup();
    let third = stage.add(text_overlay("third", 400.0));
    stage.set_enabled(second, false).unwrap();

    stage.handle_gesture(first, &pan(GesturePhase::Began, 0.0, 0.0)).unwrap();
    assert!(!stage.get(third).unwrap().is_enabled());
    stage.handle_gesture(first, &pan(GesturePhase::Ended, 5.0, 5.0)).unwrap();

    assert!(stage.get(first).unwrap().is_enabled());
    assert!(!stage.get(second).unwrap().is_enabled());
    assert!(stage.get(third).unwrap().is_enabled());

    // The host may pin a frozen sibling mid-operation
    stage.handle_gesture(first, &pan(GesturePhase::Began, 0.0, 0.0)).unwrap();
    stage.set_enabled(third, false).unwrap();
    stage.handle_gesture(first, &pan(GesturePhase::Ended, 0.0, 0.0)).unwrap();
    assert!(!stage.get(third).unwrap().is_enabled());
}

#[test]
fn test_simultaneous_recognizers_share_one_operation() {
    let (mut stage, first, _second, events) = setup();

    let pinch = |phase, factor| Gesture::Pinch { phase, factor };
    let rotate = |phase, delta| Gesture::Rotate { phase, delta };

    stage.handle_gesture(first, &pinch(GesturePhase::Began, 1.0)).unwrap();
    stage.handle_gesture(first, &rotate(GesturePhase::Began, 0.1)).unwrap();
    stage.handle_gesture(first, &pinch(GesturePhase::Changed, 2.0)).unwrap();
    // Pinch lifts first; the rotation keeps the operation alive
    stage.handle_gesture(first, &pinch(GesturePhase::Ended, 1.0)).unwrap();
    assert!(stage.get(first).unwrap().is_manipulating());
    stage.handle_gesture(first, &rotate(GesturePhase::Ended, 0.0)).unwrap();

    let overlay = stage.get(first).unwrap();
    assert!(!overlay.is_manipulating());
    assert_eq!(overlay.transform().gesture_scale(), 2.0);
    assert!((overlay.transform().gesture_rotation() - 0.1).abs() < 1e-6);

    let events = events.lock();
    let begins = events
        .iter()
        .filter(|e| matches!(e, OverlayEvent::OperationBegin { .. }))
        .count();
    let ends = events
        .iter()
        .filter(|e| matches!(e, OverlayEvent::OperationEnd { .. }))
        .count();
    assert_eq!((begins, ends), (1, 1));
}

#[test]
fn test_disabled_overlay_ignores_gestures() {
    let (mut stage, first, _second, events) = setup();
    stage.set_enabled(first, false).unwrap();

    let outcome = stage.handle_gesture(first, &Gesture::Tap).unwrap();
    assert_eq!(outcome, GestureOutcome::Ignored);
    assert!(events.lock().is_empty());
    assert_eq!(stage.selected(), None);
}

#[test]
fn test_snapshot_restores_transform() {
    let (mut stage, first, _second, _events) = setup();
    stage.handle_gesture(first, &pan(GesturePhase::Began, 0.0, 0.0)).unwrap();
    stage.handle_gesture(first, &pan(GesturePhase::Ended, 12.0, -4.0)).unwrap();
    stage.resize(first, 1.5).unwrap();

    let record = stage.snapshot_state(first).unwrap();
    let visible = stage.get(first).unwrap().transform().visible();
    stage.remove(first);

    let restored = stage.restore_from_state(record.clone());
    assert_ne!(restored, first);
    let overlay = stage.get(restored).unwrap();
    assert_eq!(overlay.transform().visible(), visible);
    assert_eq!(overlay.state(), record);
    assert_eq!(stage.ids().last(), Some(&restored));
}

#[test]
fn test_unknown_overlay_is_an_error() {
    let (mut stage, first, _second, _events) = setup();
    stage.remove(first);
    assert!(matches!(
        stage.handle_gesture(first, &Gesture::Tap),
        Err(MarkupError::OverlayNotFound(id)) if id == first
    ));
}

#[test]
fn test_unsubscribed_handler_stops_receiving() {
    init_logger();
    let mut stage = OverlayStage::new(15.0);
    let id = stage.add(text_overlay("solo", 0.0));
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscription = stage
        .events()
        .subscribe(Box::new(EventRecorder(events.clone())));
    assert_eq!(stage.events().handler_count(), 1);

    stage.handle_gesture(id, &Gesture::Tap).unwrap();
    assert!(stage.events().unsubscribe(subscription));
    assert!(!stage.events().unsubscribe(subscription));
    stage.handle_gesture(id, &Gesture::Tap).unwrap();

    // Text edit request and tap from the first tap only
    assert_eq!(events.lock().len(), 2);
}
