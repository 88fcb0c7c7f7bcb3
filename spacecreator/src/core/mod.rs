mod config;
mod display;
mod locate;
mod notification;
mod orchestrator;
mod permission;
mod strategy;

pub use config::*;
pub use display::*;
pub use locate::*;
pub use notification::*;
pub use orchestrator::*;
pub use permission::*;
pub use strategy::*;
