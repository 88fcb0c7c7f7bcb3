use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::TrustState;
use crate::macos::HotkeyManager;

/// Whether the global hotkey tap is live, shared between the main thread
/// (which owns the tap) and the automation thread (which sees trust change).
#[derive(Debug, Default)]
pub struct HotkeyStatus {
    installed: AtomicBool,
    pending: AtomicBool,
}

impl HotkeyStatus {
    /// Status while the main thread makes its first attempt; retries wait
    /// for that to finish.
    pub fn starting() -> Self {
        Self {
            installed: AtomicBool::new(false),
            pending: AtomicBool::new(true),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Record the result of an install attempt and allow the next one.
    pub fn finish_attempt(&self, installed: bool) {
        self.installed.store(installed, Ordering::Release);
        self.pending.store(false, Ordering::Release);
    }

    /// Claim the single in-flight attempt. False when one is already queued.
    fn begin_attempt(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }
}

/// Re-installs the hotkey tap once trust shows up. Creating the tap fails
/// without Accessibility trust, so a first launch before the user grants it
/// leaves the hotkey dead until this fires.
pub struct HotkeyRetry {
    status: Arc<HotkeyStatus>,
    install: Box<dyn Fn()>,
}

impl HotkeyRetry {
    /// `install` must eventually call [`HotkeyStatus::finish_attempt`].
    pub fn new(status: Arc<HotkeyStatus>, install: impl Fn() + 'static) -> Self {
        Self {
            status,
            install: Box::new(install),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.status.is_installed()
    }

    /// Feed every fresh trust reading through here. Returns true when an
    /// install was requested.
    pub fn observe(&self, trust: TrustState) -> bool {
        if trust != TrustState::Granted || self.status.is_installed() {
            return false;
        }
        if !self.status.begin_attempt() {
            return false;
        }
        tracing::info!("Accessibility permission granted, installing global hotkey");
        (self.install)();
        true
    }
}

thread_local! {
    /// The hotkey manager lives on the main thread with its run loop source.
    static MAIN_THREAD_HOTKEYS: RefCell<Option<HotkeyManager>> = const { RefCell::new(None) };
}

/// Start the tap and keep the manager on the current (main) thread, whether
/// or not the tap could be created.
pub fn install_on_main_thread(mut hotkeys: HotkeyManager, status: &HotkeyStatus) {
    let installed = match hotkeys.start() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                "Global hotkey unavailable until Accessibility permission is granted: {}",
                e
            );
            false
        }
    };
    status.finish_attempt(installed);
    MAIN_THREAD_HOTKEYS.with(|slot| *slot.borrow_mut() = Some(hotkeys));
}

/// Queue a tap install on the main thread. Callable from any thread.
pub fn request_install(status: Arc<HotkeyStatus>) {
    dispatch::Queue::main().exec_async(move || {
        let installed = MAIN_THREAD_HOTKEYS.with(|slot| match slot.borrow_mut().as_mut() {
            Some(hotkeys) if hotkeys.is_active() => true,
            Some(hotkeys) => match hotkeys.start() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Retrying global hotkey failed: {}", e);
                    false
                }
            },
            None => false,
        });
        status.finish_attempt(installed);
    });
}
