use crate::macos::{describe_ax_error, PermissionAlert};
use crate::platform::{UserInterface, WindowSystem};

/// Deep link to the Accessibility pane of the privacy settings.
pub const ACCESSIBILITY_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustState {
    #[default]
    Unknown,
    Denied,
    Granted,
}

/// Queries the Accessibility trust of this process. Nothing is cached:
/// trust can be revoked at any time, so every call asks the OS again.
pub struct PermissionGate<'a, P> {
    platform: &'a P,
}

impl<'a, P: WindowSystem + UserInterface> PermissionGate<'a, P> {
    pub fn new(platform: &'a P) -> Self {
        Self { platform }
    }

    /// A failed query counts as denied.
    pub fn check(&self) -> TrustState {
        match self.platform.is_trusted() {
            Ok(true) => TrustState::Granted,
            Ok(false) => TrustState::Denied,
            Err(e) => {
                tracing::warn!(
                    "Trust query failed ({}: {}), treating as denied",
                    e,
                    describe_ax_error(e)
                );
                TrustState::Denied
            }
        }
    }

    /// Surface the OS consent prompt when trust is missing. The prompt's
    /// own answer is returned, so a grant that is already in place by the
    /// time it returns counts.
    pub fn request_if_needed(&self) -> TrustState {
        let state = self.check();
        if state == TrustState::Granted {
            return state;
        }
        tracing::warn!("Accessibility permission not granted, requesting...");
        if self.platform.request_trust() {
            tracing::info!("Accessibility permission granted");
            TrustState::Granted
        } else {
            state
        }
    }

    /// Returns true when guidance was shown.
    pub fn show_guidance_if_denied(&self, state: TrustState) -> bool {
        if state == TrustState::Granted {
            return false;
        }
        self.platform
            .show_permission_alert(PermissionAlert::Guidance, ACCESSIBILITY_SETTINGS_URL);
        true
    }

    /// Re-query and always show the result to the user.
    pub fn report(&self) -> TrustState {
        let state = self.check();
        if state == TrustState::Granted {
            self.platform
                .show_permission_alert(PermissionAlert::Granted, ACCESSIBILITY_SETTINGS_URL);
        } else {
            self.show_guidance_if_denied(state);
        }
        state
    }
}
