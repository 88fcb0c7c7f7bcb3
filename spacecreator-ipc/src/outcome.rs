use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal result of one create-space invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateSpaceOutcome {
    Succeeded,
    PermissionDenied,
    AllStrategiesFailed,
    /// Another invocation was still running; nothing was attempted.
    Busy,
}

impl CreateSpaceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CreateSpaceOutcome::Succeeded)
    }
}

impl fmt::Display for CreateSpaceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CreateSpaceOutcome::Succeeded => "space created",
            CreateSpaceOutcome::PermissionDenied => "accessibility permission denied",
            CreateSpaceOutcome::AllStrategiesFailed => "all automation strategies failed",
            CreateSpaceOutcome::Busy => "another space creation is in progress",
        };
        f.write_str(s)
    }
}
