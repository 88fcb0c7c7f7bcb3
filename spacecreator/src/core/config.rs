use std::time::Duration;

use crate::macos::{key_code, Hotkey, Modifiers};

/// Fixed waits between automation phases. They cover the overview's own
/// animation latency and are not adaptive: under heavy load the overview
/// can lag behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// After invoking the overview, before looking for the add control.
    pub overview_open: Duration,
    /// After hovering the add control's area, before clicking it.
    pub control_reveal: Duration,
    /// After activating the control, before dismissing the overview; also
    /// the pause between strategies.
    pub settle: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            overview_open: Duration::from_millis(600),
            control_reveal: Duration::from_millis(400),
            settle: Duration::from_millis(300),
        }
    }
}

/// Default chord: Control + Option + Shift + D.
pub const DEFAULT_HOTKEY: Hotkey = Hotkey {
    key_code: key_code::D,
    modifiers: Modifiers {
        cmd: false,
        alt: true,
        ctrl: true,
        shift: true,
    },
};

/// Daemon settings, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub hotkey: Hotkey,
    pub timings: Timings,
    pub menu_bar: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotkey: DEFAULT_HOTKEY,
            timings: Timings::default(),
            menu_bar: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macos::parse_hotkey;

    #[test]
    fn test_default_hotkey_matches_parsed_chord() {
        assert_eq!(parse_hotkey("ctrl-alt-shift-d").unwrap(), DEFAULT_HOTKEY);
    }

    #[test]
    fn test_default_timings() {
        let t = Timings::default();
        assert_eq!(t.overview_open, Duration::from_millis(600));
        assert_eq!(t.control_reveal, Duration::from_millis(400));
        assert_eq!(t.settle, Duration::from_millis(300));
    }
}
