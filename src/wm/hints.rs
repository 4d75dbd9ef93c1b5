//! Hints Module
//!
//! Reads the window properties the WM mirrors into its records: names, class,
//! client leader and the configured application id property.

use tracing::warn;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

/// Property access used by the event handlers
///
/// Read failures are reported as absent values; a window that vanished
/// between the event and the read is not an error.
pub trait PropertySource {
    /// Text property (STRING, UTF8_STRING or COMPOUND_TEXT bytes)
    fn text(&self, window: u32, property: Atom) -> Option<String>;

    /// Class part of WM_CLASS
    fn class(&self, window: u32) -> Option<String>;

    /// Single WINDOW-typed value
    fn window(&self, window: u32, property: Atom) -> Option<u32>;
}

/// Longest property read, in 32-bit units
const MAX_PROPERTY_LENGTH: u32 = 1024;

/// WM_CLASS is `instance\0class\0`; returns the class
pub fn parse_wm_class(value: &[u8]) -> Option<String> {
    let mut parts = value.split(|&b| b == 0);
    let _instance = parts.next()?;
    let class = parts.next().filter(|class| !class.is_empty())?;
    Some(String::from_utf8_lossy(class).into_owned())
}

/// x11rb-backed property reader
pub struct X11Properties<'a, C: Connection> {
    conn: &'a C,
}

impl<'a, C: Connection> X11Properties<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    fn read(&self, window: u32, property: Atom, type_: impl Into<Atom>) -> Option<GetPropertyReply> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, MAX_PROPERTY_LENGTH)
            .map_err(anyhow::Error::from)
            .and_then(|cookie| cookie.reply().map_err(anyhow::Error::from));
        match reply {
            Ok(reply) if reply.type_ != u32::from(AtomEnum::NONE) => Some(reply),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to read property {} of window {}: {}", property, window, e);
                None
            }
        }
    }
}

impl<C: Connection> PropertySource for X11Properties<'_, C> {
    fn text(&self, window: u32, property: Atom) -> Option<String> {
        let reply = self.read(window, property, AtomEnum::ANY)?;
        if reply.format != 8 {
            return None;
        }
        Some(String::from_utf8_lossy(&reply.value).into_owned())
    }

    fn class(&self, window: u32) -> Option<String> {
        let reply = self.read(window, u32::from(AtomEnum::WM_CLASS), AtomEnum::STRING)?;
        parse_wm_class(&reply.value)
    }

    fn window(&self, window: u32, property: Atom) -> Option<u32> {
        let reply = self.read(window, property, AtomEnum::WINDOW)?;
        reply.value32()?.next().filter(|&id| id != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wm_class() {
        assert_eq!(parse_wm_class(b"xterm\0XTerm\0"), Some("XTerm".to_string()));
        assert_eq!(parse_wm_class(b"xterm\0XTerm"), Some("XTerm".to_string()));
        assert_eq!(parse_wm_class(b"xterm\0"), None);
        assert_eq!(parse_wm_class(b""), None);
    }
}
