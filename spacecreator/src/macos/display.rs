use core_foundation::{
    array::CFArray, base::TCFType, dictionary::CFDictionary, number::CFNumber, string::CFString,
};
use core_graphics::display::{CGDisplayBounds, CGMainDisplayID};
use core_graphics::geometry::CGPoint;
use core_graphics::window::{
    kCGNullWindowID, kCGWindowListExcludeDesktopElements, kCGWindowListOptionOnScreenOnly,
    CGWindowListCopyWindowInfo,
};

pub type DisplayId = u32;

/// A display as seen by the display-enumeration API: bottom-left origin,
/// relative to the primary display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayInfo {
    pub id: DisplayId,
    pub frame: Bounds,
    /// The OS main display, which sits at the origin of the global space.
    pub is_primary: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Bottom edge exclusive, top edge inclusive: a point flipped out of a
    /// top-left space lands its top row inside the display, not above it.
    pub fn contains(&self, point: CGPoint) -> bool {
        point.x >= self.x && point.x < self.max_x() && point.y > self.y && point.y <= self.max_y()
    }
}

/// Flip a rectangle from top-left global coordinates into bottom-left
/// coordinates anchored at the primary display.
pub fn flip_bounds(global: Bounds, primary_height: f64) -> Bounds {
    Bounds {
        x: global.x,
        y: primary_height - global.max_y(),
        width: global.width,
        height: global.height,
    }
}

pub fn get_all_displays() -> Vec<DisplayInfo> {
    let display_ids = get_active_display_ids();
    if display_ids.is_empty() {
        return Vec::new();
    }

    let main_display_id = unsafe { CGMainDisplayID() };
    let primary_height = get_display_bounds(main_display_id).height;

    display_ids
        .iter()
        .map(|&display_id| DisplayInfo {
            id: display_id,
            frame: flip_bounds(get_display_bounds(display_id), primary_height),
            is_primary: display_id == main_display_id,
        })
        .collect()
}

/// Get active display IDs using Core Graphics directly.
/// Unlike NSScreen::screens(), this is safe off the main thread.
pub fn get_active_display_ids() -> Vec<DisplayId> {
    use core_graphics::display::CGGetActiveDisplayList;

    const MAX_DISPLAYS: u32 = 16;
    let mut display_ids: [u32; 16] = [0; 16];
    let mut display_count: u32 = 0;

    let result = unsafe {
        CGGetActiveDisplayList(MAX_DISPLAYS, display_ids.as_mut_ptr(), &mut display_count)
    };

    if result != 0 {
        tracing::warn!("CGGetActiveDisplayList failed: {}", result);
        return Vec::new();
    }

    display_ids[..display_count as usize].to_vec()
}

/// Owners of the on-screen normal-layer windows, front to back. A pid
/// appears once per window.
pub fn on_screen_window_owners() -> Vec<i32> {
    let options = kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements;
    let window_list: CFArray = unsafe {
        CFArray::wrap_under_create_rule(CGWindowListCopyWindowInfo(options, kCGNullWindowID))
    };

    let mut owners = Vec::new();
    for i in 0..window_list.len() {
        let dict_ptr = unsafe { *window_list.get_unchecked(i) };
        let dict: CFDictionary = unsafe { CFDictionary::wrap_under_get_rule(dict_ptr as *const _) };

        let layer = get_number(&dict, "kCGWindowLayer").and_then(|n| n.to_i32());
        let pid = get_number(&dict, "kCGWindowOwnerPID").and_then(|n| n.to_i32());
        if let (Some(0), Some(pid)) = (layer, pid) {
            owners.push(pid);
        }
    }
    owners
}

fn get_number(dict: &CFDictionary, key: &str) -> Option<CFNumber> {
    let key = CFString::new(key);
    unsafe {
        let value = dict.find(key.as_concrete_TypeRef() as *const _)?;
        Some(CFNumber::wrap_under_get_rule(*value as *const _))
    }
}

/// Display bounds in Core Graphics (top-left origin) coordinates.
fn get_display_bounds(display_id: DisplayId) -> Bounds {
    let rect = unsafe { CGDisplayBounds(display_id) };
    Bounds {
        x: rect.origin.x,
        y: rect.origin.y,
        width: rect.size.width,
        height: rect.size.height,
    }
}
