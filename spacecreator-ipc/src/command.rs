use serde::{Deserialize, Serialize};

use crate::CreateSpaceOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    CreateSpace,
    CheckPermissions,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    Outcome { outcome: CreateSpaceOutcome },
    Permission { trusted: bool },
    Status { phase: String },
}
