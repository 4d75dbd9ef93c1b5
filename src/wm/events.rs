//! Events Module
//!
//! Decodes X11 events into the guest events the window manager consumes and
//! performs the X-side follow-up each one needs.

use anyhow::Result;
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;

use crate::channel::WaylandChannel;
use crate::error::WmError;
use crate::shared::window_state::Geometry;
use crate::wm::hints::PropertySource;
use crate::wm::WindowManager;

/// Window manager input, decoded from an X11 event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuestEvent {
    Create {
        window: u32,
        override_redirect: bool,
        geometry: Geometry,
    },
    Destroy {
        window: u32,
    },
    Reparent {
        window: u32,
        parent: u32,
    },
    MapRequest {
        window: u32,
    },
    Unmap {
        window: u32,
    },
    /// Only the fields named in the request's value mask are set
    ConfigureRequest {
        window: u32,
        x: Option<i32>,
        y: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
    },
    FocusIn {
        window: u32,
    },
    /// Also sent on deletion; readers then see no value
    PropertyNotify {
        window: u32,
        atom: Atom,
    },
    ClientMessage {
        window: u32,
        message_type: Atom,
        data: [u32; 5],
    },
}

impl GuestEvent {
    pub fn from_x11(event: &Event) -> Option<Self> {
        let event = match event {
            Event::CreateNotify(e) => Self::Create {
                window: e.window,
                override_redirect: e.override_redirect,
                geometry: Geometry::new(
                    i32::from(e.x),
                    i32::from(e.y),
                    u32::from(e.width),
                    u32::from(e.height),
                ),
            },
            Event::DestroyNotify(e) => Self::Destroy { window: e.window },
            Event::ReparentNotify(e) => Self::Reparent {
                window: e.window,
                parent: e.parent,
            },
            Event::MapRequest(e) => Self::MapRequest { window: e.window },
            Event::UnmapNotify(e) => Self::Unmap { window: e.window },
            Event::ConfigureRequest(e) => {
                let mask = u16::from(e.value_mask);
                let has = |flag: ConfigWindow| mask & u16::from(flag) != 0;
                Self::ConfigureRequest {
                    window: e.window,
                    x: has(ConfigWindow::X).then_some(i32::from(e.x)),
                    y: has(ConfigWindow::Y).then_some(i32::from(e.y)),
                    width: has(ConfigWindow::WIDTH).then_some(u32::from(e.width)),
                    height: has(ConfigWindow::HEIGHT).then_some(u32::from(e.height)),
                }
            }
            Event::FocusIn(e) => Self::FocusIn { window: e.event },
            Event::PropertyNotify(e) => Self::PropertyNotify {
                window: e.window,
                atom: e.atom,
            },
            Event::ClientMessage(e) if e.format == 32 => Self::ClientMessage {
                window: e.window,
                message_type: e.type_,
                data: e.data.as_data32(),
            },
            _ => return None,
        };
        Some(event)
    }

    pub fn window(&self) -> u32 {
        match self {
            Self::Create { window, .. }
            | Self::Destroy { window }
            | Self::Reparent { window, .. }
            | Self::MapRequest { window }
            | Self::Unmap { window }
            | Self::ConfigureRequest { window, .. }
            | Self::FocusIn { window }
            | Self::PropertyNotify { window, .. }
            | Self::ClientMessage { window, .. } => *window,
        }
    }
}

/// Result of event handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event was handled successfully
    Handled,
    /// Event should be ignored
    Ignore,
}

/// Event router - feeds X11 events to the window manager
#[derive(Debug, Default)]
pub struct EventRouter;

impl EventRouter {
    pub fn new() -> Self {
        Self
    }

    /// Route an event to the window manager, then do the X-side follow-up
    pub fn route_event<C, W, P>(
        &mut self,
        conn: &C,
        wm: &mut WindowManager<W>,
        props: &P,
        event: &Event,
    ) -> Result<EventResult>
    where
        C: Connection,
        W: WaylandChannel,
        P: PropertySource,
    {
        if let Event::Error(e) = event {
            warn!(
                "X11 Error: error_code={}, request_code={}, minor_code={}",
                e.error_code, e.major_opcode, e.minor_opcode
            );
            return Ok(EventResult::Handled);
        }

        let Some(guest_event) = GuestEvent::from_x11(event) else {
            debug!("Ignoring event: {:?}", event);
            return Ok(EventResult::Ignore);
        };
        debug!("{:?}", guest_event);

        match wm.handle_event(props, guest_event.clone()) {
            Ok(()) => {}
            Err(WmError::DuplicateWindow(id)) => {
                warn!("Window 0x{:x} created twice, keeping the existing record", id);
            }
            Err(e) => warn!(
                "Failed to handle event for window 0x{:x}: {}",
                guest_event.window(),
                e
            ),
        }

        match event {
            Event::CreateNotify(e) => {
                conn.change_window_attributes(
                    e.window,
                    &ChangeWindowAttributesAux::new()
                        .event_mask(EventMask::PROPERTY_CHANGE | EventMask::FOCUS_CHANGE),
                )?;
            }
            Event::MapRequest(e) => {
                conn.map_window(e.window)?;
            }
            Event::ConfigureRequest(e) => {
                conn.configure_window(e.window, &ConfigureWindowAux::from_configure_request(e))?;
            }
            Event::FocusIn(e) if wm.registry().contains(e.event) => {
                wm.atoms()
                    .update_active_window(conn, wm.root(), Some(e.event))?;
            }
            _ => {}
        }

        Ok(EventResult::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_request_respects_value_mask() {
        let event = Event::ConfigureRequest(ConfigureRequestEvent {
            window: 5,
            width: 640,
            height: 480,
            x: 10,
            y: 20,
            value_mask: ConfigWindow::WIDTH | ConfigWindow::HEIGHT,
            ..Default::default()
        });

        assert_eq!(
            GuestEvent::from_x11(&event),
            Some(GuestEvent::ConfigureRequest {
                window: 5,
                x: None,
                y: None,
                width: Some(640),
                height: Some(480),
            })
        );
    }

    #[test]
    fn test_client_message_data() {
        let event = Event::ClientMessage(ClientMessageEvent::new(
            32,
            9,
            77u32,
            [1u32, 2, 3, 4, 5],
        ));

        let decoded = GuestEvent::from_x11(&event).unwrap();
        assert_eq!(
            decoded,
            GuestEvent::ClientMessage {
                window: 9,
                message_type: 77,
                data: [1, 2, 3, 4, 5],
            }
        );
        assert_eq!(decoded.window(), 9);
    }

    #[test]
    fn test_property_delete() {
        let event = Event::PropertyNotify(PropertyNotifyEvent {
            window: 3,
            atom: 39,
            state: Property::DELETE,
            ..Default::default()
        });
        assert_eq!(
            GuestEvent::from_x11(&event),
            Some(GuestEvent::PropertyNotify {
                window: 3,
                atom: 39,
            })
        );
    }
}
