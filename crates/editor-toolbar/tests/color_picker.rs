use std::cell::RefCell;
use std::rc::Rc;

use blockdesk_toolbar::{ColorPicker, Hsv, PickerSurface, Rect, SelectionSuppression};
use pretty_assertions::assert_eq;

type Log = Rc<RefCell<Vec<String>>>;

fn picker(value: &str) -> (ColorPicker, Log) {
    let log: Log = Rc::default();
    let sink = log.clone();
    let picker = ColorPicker::new(value, move |hex| sink.borrow_mut().push(hex.to_string()));
    (picker, log)
}

#[test]
fn starts_from_parsed_value_or_black() {
    let (red, _) = picker("rgb(255, 0, 0)");
    assert_eq!(red.hsv(), Hsv::new(0.0, 1.0, 1.0));
    assert_eq!(red.hex_input(), "#ff0000");

    let (transparent, _) = picker("transparent");
    assert_eq!(transparent.hex_input(), "#000000");

    let (garbage, _) = picker("inherit");
    assert_eq!(garbage.hex(), "#000000");
}

#[test]
fn invalid_hex_reverts_without_change() {
    let (mut picker, log) = picker("#ff0000");

    picker.set_hex_input("12g");
    assert!(!picker.commit_hex_input());

    assert_eq!(picker.hex_input(), "#ff0000");
    assert!(log.borrow().is_empty());
}

#[test]
fn three_hex_digits_commit_as_short_hex() {
    let (mut picker, log) = picker("#ff0000");

    picker.set_hex_input("12a");
    assert!(picker.commit_hex_input());

    assert_eq!(picker.hex_input(), "#1122aa");
    assert_eq!(*log.borrow(), vec!["#1122aa".to_string()]);
}

#[test]
fn short_hex_is_normalized_and_reported() {
    let (mut picker, log) = picker("#ff0000");

    picker.set_hex_input(" 1A2 ");
    assert!(picker.commit_hex_input());

    assert_eq!(picker.hex_input(), "#11aa22");
    assert_eq!(picker.hex(), "#11aa22");
    assert_eq!(*log.borrow(), vec!["#11aa22".to_string()]);
}

#[test]
fn pad_drag_tracks_pointer_and_clamps_outside_the_surface() {
    let (picker_with_log, log) = picker("#ff0000");
    let suppression = SelectionSuppression::new();
    let drag_states: Rc<RefCell<Vec<bool>>> = Rc::default();
    let sink = drag_states.clone();
    let mut picker = picker_with_log
        .with_suppression(suppression.clone())
        .on_drag_state_change(move |dragging| sink.borrow_mut().push(dragging));
    let pad = Rect::new(0.0, 0.0, 100.0, 100.0);

    picker.pointer_down(PickerSurface::SaturationValue, pad, 50.0, 25.0);
    assert!(picker.is_dragging());
    assert!(suppression.is_active());
    assert_eq!(picker.hsv(), Hsv::new(0.0, 0.5, 0.75));
    assert_eq!(picker.saturation_value_thumb(), (0.5, 0.25));

    picker.pointer_move(250.0, -40.0);
    assert_eq!(picker.hsv(), Hsv::new(0.0, 1.0, 1.0));

    picker.pointer_up();
    picker.pointer_move(0.0, 100.0);

    assert!(!picker.is_dragging());
    assert!(!suppression.is_active());
    assert_eq!(*drag_states.borrow(), vec![true, false]);
    assert_eq!(
        *log.borrow(),
        vec!["#bf6060".to_string(), "#ff0000".to_string()]
    );
}

#[test]
fn hue_strip_maps_width_to_degrees() {
    let (mut picker, log) = picker("#ff0000");
    let strip = Rect::new(10.0, 0.0, 360.0, 12.0);

    picker.pointer_down(PickerSurface::Hue, strip, 130.0, 6.0);
    assert!((picker.hsv().h - 120.0).abs() < 1e-3);
    assert_eq!(log.borrow().last().map(String::as_str), Some("#00ff00"));

    picker.pointer_move(1000.0, 6.0);
    assert_eq!(picker.hsv().h, 0.0);
    assert_eq!(picker.hue_thumb(), 0.0);

    picker.pointer_move(-50.0, 6.0);
    assert_eq!(picker.hsv().h, 0.0);
    picker.pointer_up();
}

#[test]
fn clear_prefers_clear_handler() {
    let (plain, log) = picker("#ff0000");
    let mut plain = plain.allow_transparent(true);
    assert_eq!(plain.clear_button_label(), Some("Clear"));
    plain.clear();
    assert_eq!(*log.borrow(), vec!["transparent".to_string()]);

    let cleared = Rc::new(RefCell::new(0));
    let counter = cleared.clone();
    let (with_handler, log) = picker("#ff0000");
    let mut with_handler = with_handler
        .clear_label("Reset")
        .on_clear(move || *counter.borrow_mut() += 1);
    assert_eq!(with_handler.clear_button_label(), Some("Reset"));
    with_handler.clear();
    assert_eq!(*cleared.borrow(), 1);
    assert!(log.borrow().is_empty());

    let (bare, _) = picker("#ff0000");
    assert_eq!(bare.clear_button_label(), None);
}
