use objc2_app_kit::{NSRunningApplication, NSWorkspace};
use objc2_foundation::{NSString, NSURL};

/// Process identifier of the frontmost application, if any.
pub fn frontmost_pid() -> Option<i32> {
    let app = unsafe { NSWorkspace::sharedWorkspace().frontmostApplication() }?;
    Some(app.processIdentifier())
}

/// First running process with the given bundle identifier.
pub fn pid_for_bundle_id(bundle_id: &str) -> Option<i32> {
    let bundle_id = NSString::from_str(bundle_id);
    let apps =
        unsafe { NSRunningApplication::runningApplicationsWithBundleIdentifier(&bundle_id) };
    apps.firstObject().map(|app| app.processIdentifier())
}

pub fn open_url(url: &str) -> Result<(), String> {
    let ns_url = unsafe { NSURL::URLWithString(&NSString::from_str(url)) }
        .ok_or_else(|| format!("Invalid URL: {}", url))?;
    let opened = unsafe { NSWorkspace::sharedWorkspace().openURL(&ns_url) };
    if opened {
        tracing::info!("Opened {}", url);
        Ok(())
    } else {
        Err(format!("Failed to open {}", url))
    }
}
