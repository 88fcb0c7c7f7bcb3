use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGMouseButton};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::CGPoint;

use super::Modifiers;

fn event_source() -> Result<CGEventSource, String> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| "Failed to create event source".to_string())
}

/// Post a key-down/key-up pair carrying `modifiers` at the HID tap.
pub fn post_key_chord(key_code: u16, modifiers: Modifiers) -> Result<(), String> {
    let flags = modifiers.event_flags();
    for key_down in [true, false] {
        let event = CGEvent::new_keyboard_event(event_source()?, key_code, key_down)
            .map_err(|_| format!("Failed to create key event for code {:#04x}", key_code))?;
        event.set_flags(flags);
        event.post(CGEventTapLocation::HID);
    }
    tracing::debug!("Posted key chord {:#04x} {:?}", key_code, modifiers);
    Ok(())
}

fn post_mouse_event(event_type: CGEventType, point: CGPoint) -> Result<(), String> {
    let event = CGEvent::new_mouse_event(event_source()?, event_type, point, CGMouseButton::Left)
        .map_err(|_| format!("Failed to create mouse event at ({}, {})", point.x, point.y))?;
    event.post(CGEventTapLocation::HID);
    Ok(())
}

/// `point` is in global top-left-origin coordinates.
pub fn move_pointer(point: CGPoint) -> Result<(), String> {
    post_mouse_event(CGEventType::MouseMoved, point)?;
    tracing::debug!("Moved pointer to ({}, {})", point.x, point.y);
    Ok(())
}

/// Left button down/up at `point` (global top-left-origin coordinates).
pub fn click(point: CGPoint) -> Result<(), String> {
    post_mouse_event(CGEventType::LeftMouseDown, point)?;
    post_mouse_event(CGEventType::LeftMouseUp, point)?;
    tracing::debug!("Clicked at ({}, {})", point.x, point.y);
    Ok(())
}
