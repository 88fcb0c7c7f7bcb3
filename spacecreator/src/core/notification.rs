use spacecreator_ipc::CreateSpaceOutcome;

use crate::platform::UserInterface;

pub const SUCCESS_TITLE: &str = "Space Created";
pub const SUCCESS_BODY: &str = "New desktop space added";

/// Reports the end of an invocation. Only a success is shown to the user;
/// everything else goes to the log.
pub struct NotificationSink<'a, U> {
    ui: &'a U,
}

impl<'a, U: UserInterface> NotificationSink<'a, U> {
    pub fn new(ui: &'a U) -> Self {
        Self { ui }
    }

    pub fn notify(&self, outcome: CreateSpaceOutcome) {
        match outcome {
            CreateSpaceOutcome::Succeeded => {
                tracing::info!("{}", outcome);
                self.ui.post_notification(SUCCESS_TITLE, SUCCESS_BODY);
            }
            CreateSpaceOutcome::Busy => tracing::debug!("{}", outcome),
            CreateSpaceOutcome::PermissionDenied | CreateSpaceOutcome::AllStrategiesFailed => {
                tracing::warn!("No space created: {}", outcome)
            }
        }
    }
}
