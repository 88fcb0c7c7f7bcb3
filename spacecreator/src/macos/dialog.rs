use std::process::Command as ProcessCommand;

use objc2::MainThreadMarker;
use objc2_app_kit::{NSAlert, NSAlertFirstButtonReturn, NSAlertStyle, NSApplication};
use objc2_foundation::NSString;

use super::open_url;

/// Kind of permission alert shown on the main thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAlert {
    /// Trust is granted; purely informational.
    Granted,
    /// Trust is missing; offers to open the privacy settings.
    Guidance,
}

/// Show a permission alert from any thread. The alert is modal on the main
/// queue; confirming the guidance variant opens `settings_url`.
pub fn show_permission_alert_async(kind: PermissionAlert, settings_url: &str) {
    let settings_url = settings_url.to_string();
    dispatch::Queue::main().exec_async(move || {
        let Some(mtm) = MainThreadMarker::new() else {
            tracing::error!("Permission alert dispatched off the main thread");
            return;
        };
        if run_permission_alert(mtm, kind) {
            if let Err(e) = open_url(&settings_url) {
                tracing::warn!("{}", e);
            }
        }
    });
}

/// Returns true when the user asked to open System Settings.
fn run_permission_alert(mtm: MainThreadMarker, kind: PermissionAlert) -> bool {
    let app = NSApplication::sharedApplication(mtm);
    #[allow(deprecated)]
    app.activateIgnoringOtherApps(true);

    let alert = NSAlert::new(mtm);
    match kind {
        PermissionAlert::Granted => {
            alert.setMessageText(&NSString::from_str("Accessibility Permissions Granted"));
            alert.setInformativeText(&NSString::from_str(
                "The app has the necessary permissions to create desktop spaces.",
            ));
            alert.setAlertStyle(NSAlertStyle::Informational);
        }
        PermissionAlert::Guidance => {
            alert.setMessageText(&NSString::from_str("Accessibility Permissions Required"));
            alert.setInformativeText(&NSString::from_str(
                "To create desktop spaces, please grant accessibility permissions in \
                 System Settings > Privacy & Security > Accessibility.",
            ));
            alert.setAlertStyle(NSAlertStyle::Warning);
            alert.addButtonWithTitle(&NSString::from_str("Open System Settings"));
            alert.addButtonWithTitle(&NSString::from_str("Cancel"));
        }
    }

    let response = alert.runModal();
    kind == PermissionAlert::Guidance && response == NSAlertFirstButtonReturn
}

/// Quote a string as an AppleScript literal.
fn applescript_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Fire-and-forget user notification through `osascript`.
pub fn post_notification(title: &str, body: &str) {
    let script = format!(
        "display notification {} with title {}",
        applescript_string(body),
        applescript_string(title)
    );
    std::thread::spawn(move || {
        match ProcessCommand::new("osascript").arg("-e").arg(&script).output() {
            Ok(output) if output.status.success() => {}
            Ok(output) => tracing::warn!(
                "osascript exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => tracing::warn!("Failed to run osascript: {}", e),
        }
    });
}
