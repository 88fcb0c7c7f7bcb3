mod accessibility;
mod application;
mod dialog;
mod display;
mod hotkey;
mod input;
mod menu_bar;
mod workspace;

pub use accessibility::*;
pub use application::*;
pub use dialog::*;
pub use display::*;
pub use hotkey::*;
pub use input::*;
pub use menu_bar::*;
pub use workspace::*;
