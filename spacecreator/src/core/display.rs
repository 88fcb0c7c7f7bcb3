use core_graphics::geometry::CGPoint;

use crate::macos::{flip_bounds, Bounds, DisplayInfo};
use crate::platform::WindowSystem;

/// Where the frontmost window of another application sits. Only used to
/// pick a display, then dropped.
#[derive(Debug, Clone, Copy)]
pub struct FocusedWindowHint {
    pub pid: i32,
    /// Top-left corner in top-left-origin global coordinates.
    pub position: CGPoint,
}

/// The display chosen for one invocation, together with the geometry of the
/// snapshot it was picked from. Later display changes do not affect it.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDisplay {
    pub display: DisplayInfo,
    pub primary_height: f64,
}

impl TargetDisplay {
    /// The display frame in top-left-origin global coordinates, the space
    /// synthetic pointer events use.
    pub fn global_frame(&self) -> Bounds {
        flip_bounds(self.display.frame, self.primary_height)
    }
}

/// Flip a top-left-origin point into the bottom-left display space.
pub fn to_display_space(point: CGPoint, primary_height: f64) -> CGPoint {
    CGPoint::new(point.x, primary_height - point.y)
}

fn primary(displays: &[DisplayInfo]) -> Option<&DisplayInfo> {
    displays
        .iter()
        .find(|d| d.is_primary)
        .or_else(|| displays.first())
}

/// Display containing the hinted window, else the primary display.
pub fn select_display<'a>(
    displays: &'a [DisplayInfo],
    hint: Option<&FocusedWindowHint>,
) -> Option<&'a DisplayInfo> {
    let primary = primary(displays)?;

    let focused = hint.and_then(|hint| {
        let point = to_display_space(hint.position, primary.frame.height);
        let found = displays.iter().find(|d| d.frame.contains(point));
        if found.is_none() {
            tracing::debug!(
                "Focused window of pid {} at ({}, {}) is outside every display",
                hint.pid,
                hint.position.x,
                hint.position.y
            );
        }
        found
    });

    Some(focused.unwrap_or(primary))
}

/// Picks the display that should receive the new space: the one holding the
/// focused window of the frontmost other application. Never fails; every
/// missing signal falls back to the primary display.
pub struct DisplayResolver<'a, W> {
    system: &'a W,
}

impl<'a, W: WindowSystem> DisplayResolver<'a, W> {
    pub fn new(system: &'a W) -> Self {
        Self { system }
    }

    /// The frontmost application other than this process. When this process
    /// is frontmost (after one of its alerts, say) the owner of the topmost
    /// on-screen window that is not ours stands in.
    pub fn frontmost_other_pid(&self) -> Option<i32> {
        let own_pid = self.system.own_pid();
        let pid = self.system.frontmost_pid()?;
        if pid != own_pid {
            return Some(pid);
        }

        let next = self
            .system
            .window_owners_front_to_back()
            .into_iter()
            .find(|&owner| owner != own_pid);
        tracing::debug!("Frontmost application is ourselves, next window owner: {:?}", next);
        next
    }

    pub fn focused_window_hint(&self) -> Option<FocusedWindowHint> {
        let pid = self.frontmost_other_pid()?;
        match self.system.focused_window_position(pid) {
            Ok(position) => Some(FocusedWindowHint { pid, position }),
            Err(e) => {
                tracing::debug!("No focused window position for pid {}: {}", pid, e);
                None
            }
        }
    }

    pub fn resolve_target_display(&self) -> TargetDisplay {
        let displays = self.system.get_all_displays();
        let hint = self.focused_window_hint();

        let Some(display) = select_display(&displays, hint.as_ref()) else {
            tracing::warn!("No displays enumerated, using an empty placeholder");
            return TargetDisplay {
                display: DisplayInfo {
                    id: 0,
                    frame: Bounds::default(),
                    is_primary: true,
                },
                primary_height: 0.0,
            };
        };

        let primary_height = primary(&displays).map_or(0.0, |p| p.frame.height);
        let target = display;
        tracing::debug!(
            "Target display {} ({}x{} at {}, {}), focus hint: {:?}",
            target.id,
            target.frame.width,
            target.frame.height,
            target.frame.x,
            target.frame.y,
            hint.map(|h| h.pid)
        );

        TargetDisplay {
            display: display.clone(),
            primary_height,
        }
    }
}
