use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop, CFRunLoopSource};
use core_graphics::event::{
    CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
    CGEventType, CallbackResult, EventField,
};
use spacecreator_ipc::Command;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub key_code: u16,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub cmd: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        cmd: false,
        alt: false,
        ctrl: false,
        shift: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        cmd: false,
        alt: false,
        ctrl: true,
        shift: false,
    };

    pub fn from_event_flags(flags: CGEventFlags) -> Self {
        Self {
            cmd: flags.contains(CGEventFlags::CGEventFlagCommand),
            alt: flags.contains(CGEventFlags::CGEventFlagAlternate),
            ctrl: flags.contains(CGEventFlags::CGEventFlagControl),
            shift: flags.contains(CGEventFlags::CGEventFlagShift),
        }
    }

    pub fn event_flags(&self) -> CGEventFlags {
        let mut flags = CGEventFlags::CGEventFlagNull;
        if self.cmd {
            flags |= CGEventFlags::CGEventFlagCommand;
        }
        if self.alt {
            flags |= CGEventFlags::CGEventFlagAlternate;
        }
        if self.ctrl {
            flags |= CGEventFlags::CGEventFlagControl;
        }
        if self.shift {
            flags |= CGEventFlags::CGEventFlagShift;
        }
        flags
    }
}

pub mod key_code {
    pub const D: u16 = 0x02;
    pub const ESCAPE: u16 = 0x35;
    pub const UP: u16 = 0x7E;
}

/// Key names accepted in chord strings, with their virtual key codes.
/// The first name listed for a code is the one used when formatting.
const KEY_NAMES: &[(&str, u16)] = &[
    ("a", 0x00),
    ("b", 0x0B),
    ("c", 0x08),
    ("d", 0x02),
    ("e", 0x0E),
    ("f", 0x03),
    ("g", 0x05),
    ("h", 0x04),
    ("i", 0x22),
    ("j", 0x26),
    ("k", 0x28),
    ("l", 0x25),
    ("m", 0x2E),
    ("n", 0x2D),
    ("o", 0x1F),
    ("p", 0x23),
    ("q", 0x0C),
    ("r", 0x0F),
    ("s", 0x01),
    ("t", 0x11),
    ("u", 0x20),
    ("v", 0x09),
    ("w", 0x0D),
    ("x", 0x07),
    ("y", 0x10),
    ("z", 0x06),
    ("1", 0x12),
    ("2", 0x13),
    ("3", 0x14),
    ("4", 0x15),
    ("5", 0x17),
    ("6", 0x16),
    ("7", 0x1A),
    ("8", 0x1C),
    ("9", 0x19),
    ("0", 0x1D),
    ("return", 0x24),
    ("enter", 0x24),
    ("tab", 0x30),
    ("space", 0x31),
    ("delete", 0x33),
    ("backspace", 0x33),
    ("escape", 0x35),
    ("esc", 0x35),
    ("left", 0x7B),
    ("right", 0x7C),
    ("down", 0x7D),
    ("up", 0x7E),
    ("f1", 0x7A),
    ("f2", 0x78),
    ("f3", 0x63),
    ("f4", 0x76),
    ("f5", 0x60),
    ("f6", 0x61),
    ("f7", 0x62),
    ("f8", 0x64),
    ("f9", 0x65),
    ("f10", 0x6D),
    ("f11", 0x67),
    ("f12", 0x6F),
    ("minus", 0x1B),
    ("equal", 0x18),
    ("comma", 0x2B),
    ("period", 0x2F),
    ("slash", 0x2C),
    ("grave", 0x32),
];

fn parse_key_code(key: &str) -> Result<u16, String> {
    let key = key.to_lowercase();
    KEY_NAMES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|&(_, code)| code)
        .ok_or_else(|| format!("Unknown key: {}", key))
}

fn key_name(code: u16) -> &'static str {
    KEY_NAMES
        .iter()
        .find(|&&(_, c)| c == code)
        .map(|&(name, _)| name)
        .unwrap_or("unknown")
}

pub fn parse_hotkey(key_str: &str) -> Result<Hotkey, String> {
    let parts: Vec<&str> = key_str.split('-').collect();
    let Some((key_part, modifier_parts)) = parts.split_last() else {
        return Err("Empty key string".to_string());
    };
    if key_part.is_empty() {
        return Err(format!("Missing key in '{}'", key_str));
    }

    let mut modifiers = Modifiers::default();
    for part in modifier_parts {
        match part.to_lowercase().as_str() {
            "cmd" | "super" | "command" => modifiers.cmd = true,
            "alt" | "opt" | "option" => modifiers.alt = true,
            "ctrl" | "control" => modifiers.ctrl = true,
            "shift" => modifiers.shift = true,
            _ => return Err(format!("Unknown modifier: {}", part)),
        }
    }

    Ok(Hotkey {
        key_code: parse_key_code(key_part)?,
        modifiers,
    })
}

pub fn format_hotkey(hotkey: &Hotkey) -> String {
    let mut parts = Vec::new();
    if hotkey.modifiers.cmd {
        parts.push("cmd");
    }
    if hotkey.modifiers.alt {
        parts.push("alt");
    }
    if hotkey.modifiers.ctrl {
        parts.push("ctrl");
    }
    if hotkey.modifiers.shift {
        parts.push("shift");
    }
    parts.push(key_name(hotkey.key_code));
    parts.join("-")
}

/// Menu-style rendering, e.g. `⌃⌥⇧D`, in the order macOS menus use.
pub fn format_hotkey_symbols(hotkey: &Hotkey) -> String {
    let mut out = String::new();
    if hotkey.modifiers.ctrl {
        out.push('⌃');
    }
    if hotkey.modifiers.alt {
        out.push('⌥');
    }
    if hotkey.modifiers.shift {
        out.push('⇧');
    }
    if hotkey.modifiers.cmd {
        out.push('⌘');
    }
    out.push_str(&key_name(hotkey.key_code).to_uppercase());
    out
}

pub struct HotkeyManager {
    bindings: HashMap<Hotkey, Command>,
    command_tx: UnboundedSender<Command>,
    tap: Option<HotkeyTap>,
}

impl HotkeyManager {
    pub fn new(command_tx: UnboundedSender<Command>) -> Self {
        Self {
            bindings: HashMap::new(),
            command_tx,
            tap: None,
        }
    }

    pub fn bind(&mut self, hotkey: Hotkey, command: Command) {
        tracing::info!("Binding {} to {:?}", format_hotkey(&hotkey), command);
        self.bindings.insert(hotkey, command);
    }

    pub fn is_active(&self) -> bool {
        self.tap.is_some()
    }

    /// Install the event tap on the current run loop. Needs Accessibility
    /// permission; without it the tap cannot be created.
    pub fn start(&mut self) -> Result<(), String> {
        self.tap = Some(self.create_tap()?);
        tracing::info!("Hotkey tap started with {} bindings", self.bindings.len());
        Ok(())
    }

    fn create_tap(&self) -> Result<HotkeyTap, String> {
        let bindings = self.bindings.clone();
        let tx = self.command_tx.clone();

        let tap = CGEventTap::new(
            CGEventTapLocation::Session,
            CGEventTapPlacement::HeadInsertEventTap,
            CGEventTapOptions::Default,
            vec![CGEventType::KeyDown],
            move |_proxy, _event_type, event| {
                let key_code =
                    event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
                let hotkey = Hotkey {
                    key_code,
                    modifiers: Modifiers::from_event_flags(event.get_flags()),
                };

                if let Some(command) = bindings.get(&hotkey).cloned() {
                    tracing::debug!("Hotkey matched: {:?} -> {:?}", hotkey, command);
                    if tx.send(command).is_err() {
                        tracing::error!("Failed to send command from hotkey");
                    }
                    return CallbackResult::Drop;
                }

                CallbackResult::Keep
            },
        )
        .map_err(|_| {
            "Failed to create event tap. Make sure Accessibility permission is granted."
        })?;

        tap.enable();

        let source = tap
            .mach_port()
            .create_runloop_source(0)
            .map_err(|_| "Failed to create run loop source")?;

        CFRunLoop::get_current().add_source(&source, unsafe { kCFRunLoopCommonModes });

        Ok(HotkeyTap {
            _tap: tap,
            _source: source,
        })
    }
}

struct HotkeyTap {
    _tap: CGEventTap<'static>,
    _source: CFRunLoopSource,
}
