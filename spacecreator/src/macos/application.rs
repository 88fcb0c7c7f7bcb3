use objc2::rc::Retained;
use objc2::MainThreadMarker;
use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};

/// Shared application configured as a menu bar agent: no Dock icon and no
/// main menu.
pub fn accessory_application(mtm: MainThreadMarker) -> Retained<NSApplication> {
    let app = NSApplication::sharedApplication(mtm);
    app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);
    app
}

/// Ask the main thread to terminate the application. Safe to call from any
/// thread.
pub fn request_terminate() {
    dispatch::Queue::main().exec_async(|| {
        let Some(mtm) = MainThreadMarker::new() else {
            tracing::error!("Terminate dispatched off the main thread");
            return;
        };
        tracing::info!("Terminating");
        unsafe { NSApplication::sharedApplication(mtm).terminate(None) };
    });
}
