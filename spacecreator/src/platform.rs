use crate::macos::{self, AXError, AXUIElement, DisplayId, DisplayInfo, Modifiers, PermissionAlert};
use core_graphics::geometry::CGPoint;

/// Read-only queries against the window server and the accessibility API.
/// This abstraction allows mocking in tests.
pub trait WindowSystem {
    fn is_trusted(&self) -> Result<bool, AXError>;
    fn get_all_displays(&self) -> Vec<DisplayInfo>;
    fn frontmost_pid(&self) -> Option<i32>;
    /// Owners of on-screen normal windows, frontmost first.
    fn window_owners_front_to_back(&self) -> Vec<i32>;
    fn own_pid(&self) -> i32;
    /// Top-left corner of the focused window of `pid`, in top-left-origin
    /// global coordinates.
    fn focused_window_position(&self, pid: i32) -> Result<CGPoint, AXError>;
    fn pid_for_bundle_id(&self, bundle_id: &str) -> Option<i32>;
}

/// Element tree of another process's UI.
pub trait UiTree {
    type Element: Clone;

    fn application(&self, pid: i32) -> Self::Element;
    fn children(&self, element: &Self::Element) -> Result<Vec<Self::Element>, AXError>;
    fn role(&self, element: &Self::Element) -> Result<String, AXError>;
    fn identifier(&self, element: &Self::Element) -> Result<String, AXError>;
    fn display_id(&self, element: &Self::Element) -> Result<DisplayId, AXError>;
    fn press(&self, element: &Self::Element) -> Result<(), AXError>;
}

/// Synthetic input. Points are in top-left-origin global coordinates.
pub trait InputSynthesizer {
    fn post_key_chord(&self, key_code: u16, modifiers: Modifiers) -> Result<(), String>;
    fn move_pointer(&self, point: CGPoint) -> Result<(), String>;
    fn click(&self, point: CGPoint) -> Result<(), String>;
}

/// User-facing surfaces: consent prompt, alerts and notifications.
pub trait UserInterface {
    /// Ask the OS to show its one-time consent dialog. Returns the trust
    /// state at the time of the call.
    fn request_trust(&self) -> bool;
    fn show_permission_alert(&self, kind: PermissionAlert, settings_url: &str);
    fn post_notification(&self, title: &str, body: &str);
}

pub trait Platform: WindowSystem + UiTree + InputSynthesizer + UserInterface {}

impl<T: WindowSystem + UiTree + InputSynthesizer + UserInterface> Platform for T {}

/// macOS implementation of all platform seams
#[derive(Default)]
pub struct MacOSPlatform;

impl WindowSystem for MacOSPlatform {
    fn is_trusted(&self) -> Result<bool, AXError> {
        Ok(macos::is_trusted())
    }

    fn get_all_displays(&self) -> Vec<DisplayInfo> {
        macos::get_all_displays()
    }

    fn frontmost_pid(&self) -> Option<i32> {
        macos::frontmost_pid()
    }

    fn window_owners_front_to_back(&self) -> Vec<i32> {
        macos::on_screen_window_owners()
    }

    fn own_pid(&self) -> i32 {
        std::process::id() as i32
    }

    fn focused_window_position(&self, pid: i32) -> Result<CGPoint, AXError> {
        AXUIElement::application(pid).focused_window()?.position()
    }

    fn pid_for_bundle_id(&self, bundle_id: &str) -> Option<i32> {
        macos::pid_for_bundle_id(bundle_id)
    }
}

impl UiTree for MacOSPlatform {
    type Element = AXUIElement;

    fn application(&self, pid: i32) -> AXUIElement {
        AXUIElement::application(pid)
    }

    fn children(&self, element: &AXUIElement) -> Result<Vec<AXUIElement>, AXError> {
        element.children()
    }

    fn role(&self, element: &AXUIElement) -> Result<String, AXError> {
        element.role()
    }

    fn identifier(&self, element: &AXUIElement) -> Result<String, AXError> {
        element.identifier()
    }

    fn display_id(&self, element: &AXUIElement) -> Result<DisplayId, AXError> {
        element.display_id()
    }

    fn press(&self, element: &AXUIElement) -> Result<(), AXError> {
        element.press()
    }
}

impl InputSynthesizer for MacOSPlatform {
    fn post_key_chord(&self, key_code: u16, modifiers: Modifiers) -> Result<(), String> {
        macos::post_key_chord(key_code, modifiers)
    }

    fn move_pointer(&self, point: CGPoint) -> Result<(), String> {
        macos::move_pointer(point)
    }

    fn click(&self, point: CGPoint) -> Result<(), String> {
        macos::click(point)
    }
}

impl UserInterface for MacOSPlatform {
    fn request_trust(&self) -> bool {
        macos::is_trusted_with_prompt()
    }

    fn show_permission_alert(&self, kind: PermissionAlert, settings_url: &str) {
        macos::show_permission_alert_async(kind, settings_url);
    }

    fn post_notification(&self, title: &str, body: &str) {
        macos::post_notification(title, body);
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::macos::{role, Bounds, AX_ERROR_CANNOT_COMPLETE, AX_ERROR_FAILURE, AX_ERROR_NO_VALUE};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// In-memory sink for `tracing_subscriber::fmt().with_writer(..)`.
    #[derive(Clone, Default)]
    pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        /// Install a WARN-level subscriber writing here for the current thread.
        pub fn capture_warnings(&self) -> tracing::subscriber::DefaultGuard {
            let writer = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_writer(move || writer.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::WARN)
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub const DOCK_PID: i32 = 500;
    pub const OWN_PID: i32 = 42;

    /// Side effects recorded in the order they happened.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Action {
        KeyChord { key_code: u16, modifiers: Modifiers },
        MovePointer { x: f64, y: f64 },
        Click { x: f64, y: f64 },
        Press { node: usize },
        TrustPrompt,
        Alert(PermissionAlert),
        Notification { title: String, body: String },
    }

    #[derive(Debug, Clone, Default)]
    pub struct MockNode {
        pub role: String,
        pub identifier: Option<String>,
        pub display_id: Option<DisplayId>,
        pub children: Vec<usize>,
    }

    /// Element tree indexed by node; node 0 is the application root.
    #[derive(Debug, Clone)]
    pub struct MockTree {
        pub nodes: Vec<MockNode>,
    }

    impl MockTree {
        pub fn new() -> Self {
            Self {
                nodes: vec![MockNode {
                    role: "AXApplication".to_string(),
                    ..Default::default()
                }],
            }
        }

        pub fn add(&mut self, parent: usize, role: &str, identifier: Option<&str>) -> usize {
            let id = self.nodes.len();
            self.nodes.push(MockNode {
                role: role.to_string(),
                identifier: identifier.map(str::to_string),
                ..Default::default()
            });
            self.nodes[parent].children.push(id);
            id
        }

        pub fn find(&self, identifier: &str) -> Option<usize> {
            self.nodes
                .iter()
                .position(|n| n.identifier.as_deref() == Some(identifier))
        }

        /// The Dock while the overview is open: one display container per id,
        /// each with a spaces bar holding the add button.
        pub fn mission_control(display_ids: &[DisplayId]) -> Self {
            let mut tree = Self::new();
            tree.add(0, "AXList", None);
            let mc = tree.add(0, role::GROUP, Some("mc"));
            for &display_id in display_ids {
                let display = tree.add(mc, role::GROUP, Some("mc.display"));
                tree.nodes[display].display_id = Some(display_id);
                let spaces = tree.add(display, role::GROUP, Some("mc.spaces"));
                tree.add(spaces, role::BUTTON, Some("mc.spaces.add"));
            }
            tree
        }

        /// Same shape without identifiers, as older systems expose it.
        pub fn unlabelled() -> Self {
            let mut tree = Self::new();
            tree.add(0, "AXList", None);
            let outer = tree.add(0, role::GROUP, None);
            let inner = tree.add(outer, role::GROUP, None);
            tree.add(inner, role::GROUP, None);
            let bar = tree.add(inner, role::GROUP, None);
            tree.add(bar, role::BUTTON, None);
            tree
        }

        /// The Dock with the overview closed.
        pub fn dock_only() -> Self {
            let mut tree = Self::new();
            tree.add(0, "AXList", None);
            tree
        }
    }

    impl Default for MockTree {
        fn default() -> Self {
            Self::new()
        }
    }

    pub struct MockPlatform {
        pub trust: Result<bool, AXError>,
        pub displays: Vec<DisplayInfo>,
        pub frontmost_pid: Option<i32>,
        pub window_owners: Vec<i32>,
        pub window_positions: HashMap<i32, CGPoint>,
        pub dock_pid: Option<i32>,
        pub tree: MockTree,
        pub dock_unreachable: bool,
        pub fail_input: bool,
        /// The consent prompt reports trust as granted right away.
        pub prompt_grants: bool,
        actions: RefCell<Vec<Action>>,
    }

    impl MockPlatform {
        pub fn new() -> Self {
            Self {
                trust: Ok(true),
                displays: vec![create_test_display(1, 0.0, 0.0, 1440.0, 900.0)],
                frontmost_pid: None,
                window_owners: Vec::new(),
                prompt_grants: false,
                window_positions: HashMap::new(),
                dock_pid: Some(DOCK_PID),
                tree: MockTree::mission_control(&[1]),
                dock_unreachable: false,
                fail_input: false,
                actions: RefCell::new(Vec::new()),
            }
        }

        pub fn with_trust(mut self, trust: Result<bool, AXError>) -> Self {
            self.trust = trust;
            self
        }

        pub fn with_displays(mut self, displays: Vec<DisplayInfo>) -> Self {
            self.displays = displays;
            self
        }

        pub fn with_focused_window(mut self, pid: i32, x: f64, y: f64) -> Self {
            self.frontmost_pid = Some(pid);
            self.window_positions.insert(pid, CGPoint::new(x, y));
            self
        }

        pub fn with_frontmost(mut self, pid: Option<i32>) -> Self {
            self.frontmost_pid = pid;
            self
        }

        /// Add a window for `pid` without making it frontmost.
        pub fn with_background_window(mut self, pid: i32, x: f64, y: f64) -> Self {
            self.window_positions.insert(pid, CGPoint::new(x, y));
            self
        }

        pub fn with_window_owners(mut self, owners: Vec<i32>) -> Self {
            self.window_owners = owners;
            self
        }

        pub fn with_prompt_grant(mut self) -> Self {
            self.prompt_grants = true;
            self
        }

        pub fn with_tree(mut self, tree: MockTree) -> Self {
            self.tree = tree;
            self
        }

        pub fn without_dock(mut self) -> Self {
            self.dock_pid = None;
            self
        }

        pub fn with_unreachable_dock(mut self) -> Self {
            self.dock_unreachable = true;
            self
        }

        pub fn with_failing_input(mut self) -> Self {
            self.fail_input = true;
            self
        }

        pub fn actions(&self) -> Vec<Action> {
            self.actions.borrow().clone()
        }

        pub fn notifications(&self) -> Vec<(String, String)> {
            self.actions
                .borrow()
                .iter()
                .filter_map(|a| match a {
                    Action::Notification { title, body } => Some((title.clone(), body.clone())),
                    _ => None,
                })
                .collect()
        }

        pub fn alerts(&self) -> Vec<PermissionAlert> {
            self.actions
                .borrow()
                .iter()
                .filter_map(|a| match a {
                    Action::Alert(kind) => Some(*kind),
                    _ => None,
                })
                .collect()
        }

        /// Any synthetic input or element activation.
        pub fn automation_count(&self) -> usize {
            self.actions
                .borrow()
                .iter()
                .filter(|a| {
                    matches!(
                        a,
                        Action::KeyChord { .. }
                            | Action::MovePointer { .. }
                            | Action::Click { .. }
                            | Action::Press { .. }
                    )
                })
                .count()
        }

        fn record(&self, action: Action) {
            self.actions.borrow_mut().push(action);
        }

        fn node(&self, element: &usize) -> Result<&MockNode, AXError> {
            self.tree.nodes.get(*element).ok_or(AX_ERROR_FAILURE)
        }
    }

    impl Default for MockPlatform {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WindowSystem for MockPlatform {
        fn is_trusted(&self) -> Result<bool, AXError> {
            self.trust
        }

        fn get_all_displays(&self) -> Vec<DisplayInfo> {
            self.displays.clone()
        }

        fn frontmost_pid(&self) -> Option<i32> {
            self.frontmost_pid
        }

        fn window_owners_front_to_back(&self) -> Vec<i32> {
            self.window_owners.clone()
        }

        fn own_pid(&self) -> i32 {
            OWN_PID
        }

        fn focused_window_position(&self, pid: i32) -> Result<CGPoint, AXError> {
            self.window_positions
                .get(&pid)
                .copied()
                .ok_or(AX_ERROR_NO_VALUE)
        }

        fn pid_for_bundle_id(&self, _bundle_id: &str) -> Option<i32> {
            self.dock_pid
        }
    }

    impl UiTree for MockPlatform {
        type Element = usize;

        fn application(&self, _pid: i32) -> usize {
            0
        }

        fn children(&self, element: &usize) -> Result<Vec<usize>, AXError> {
            if self.dock_unreachable {
                return Err(AX_ERROR_CANNOT_COMPLETE);
            }
            Ok(self.node(element)?.children.clone())
        }

        fn role(&self, element: &usize) -> Result<String, AXError> {
            Ok(self.node(element)?.role.clone())
        }

        fn identifier(&self, element: &usize) -> Result<String, AXError> {
            self.node(element)?.identifier.clone().ok_or(AX_ERROR_NO_VALUE)
        }

        fn display_id(&self, element: &usize) -> Result<DisplayId, AXError> {
            self.node(element)?.display_id.ok_or(AX_ERROR_NO_VALUE)
        }

        fn press(&self, element: &usize) -> Result<(), AXError> {
            self.node(element)?;
            self.record(Action::Press { node: *element });
            Ok(())
        }
    }

    impl InputSynthesizer for MockPlatform {
        fn post_key_chord(&self, key_code: u16, modifiers: Modifiers) -> Result<(), String> {
            if self.fail_input {
                return Err("event source unavailable".to_string());
            }
            self.record(Action::KeyChord {
                key_code,
                modifiers,
            });
            Ok(())
        }

        fn move_pointer(&self, point: CGPoint) -> Result<(), String> {
            if self.fail_input {
                return Err("event source unavailable".to_string());
            }
            self.record(Action::MovePointer {
                x: point.x,
                y: point.y,
            });
            Ok(())
        }

        fn click(&self, point: CGPoint) -> Result<(), String> {
            if self.fail_input {
                return Err("event source unavailable".to_string());
            }
            self.record(Action::Click {
                x: point.x,
                y: point.y,
            });
            Ok(())
        }
    }

    impl UserInterface for MockPlatform {
        fn request_trust(&self) -> bool {
            self.record(Action::TrustPrompt);
            self.prompt_grants || matches!(self.trust, Ok(true))
        }

        fn show_permission_alert(&self, kind: PermissionAlert, _settings_url: &str) {
            self.record(Action::Alert(kind));
        }

        fn post_notification(&self, title: &str, body: &str) {
            self.record(Action::Notification {
                title: title.to_string(),
                body: body.to_string(),
            });
        }
    }

    /// Display in bottom-left-origin coordinates; id 1 is the primary.
    pub fn create_test_display(
        id: DisplayId,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> DisplayInfo {
        DisplayInfo {
            id,
            frame: Bounds {
                x,
                y,
                width,
                height,
            },
            is_primary: id == 1,
        }
    }
}
