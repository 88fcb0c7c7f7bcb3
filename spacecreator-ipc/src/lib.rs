pub mod command;
pub mod outcome;

pub use command::{Command, Response};
pub use outcome::CreateSpaceOutcome;
