//! Host shell-extension requests
//!
//! The subset of `xdg_toplevel` and `zaura_surface` requests the window
//! manager forwards to the host compositor.

use crate::wire::{MessageBuilder, WireError};

/// Request opcodes, in protocol declaration order
pub mod opcode {
    pub const XDG_TOPLEVEL_SET_TITLE: u16 = 2;
    pub const XDG_TOPLEVEL_SET_MAXIMIZED: u16 = 9;
    pub const XDG_TOPLEVEL_UNSET_MAXIMIZED: u16 = 10;
    pub const XDG_TOPLEVEL_SET_FULLSCREEN: u16 = 11;
    pub const XDG_TOPLEVEL_UNSET_FULLSCREEN: u16 = 12;
    pub const XDG_TOPLEVEL_SET_MINIMIZED: u16 = 13;

    pub const ZAURA_SURFACE_SET_APPLICATION_ID: u16 = 4;
}

/// A request addressed to a host-side object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRequest {
    SetTitle { toplevel: u32, title: String },
    SetMaximized { toplevel: u32 },
    UnsetMaximized { toplevel: u32 },
    /// Fullscreen on the output of the compositor's choosing
    SetFullscreen { toplevel: u32 },
    UnsetFullscreen { toplevel: u32 },
    SetMinimized { toplevel: u32 },
    SetApplicationId { aura_surface: u32, app_id: String },
}

impl ShellRequest {
    /// Host object id the request is sent to
    pub fn target(&self) -> u32 {
        match self {
            Self::SetTitle { toplevel, .. }
            | Self::SetMaximized { toplevel }
            | Self::UnsetMaximized { toplevel }
            | Self::SetFullscreen { toplevel }
            | Self::UnsetFullscreen { toplevel }
            | Self::SetMinimized { toplevel } => *toplevel,
            Self::SetApplicationId { aura_surface, .. } => *aura_surface,
        }
    }

    pub fn opcode(&self) -> u16 {
        match self {
            Self::SetTitle { .. } => opcode::XDG_TOPLEVEL_SET_TITLE,
            Self::SetMaximized { .. } => opcode::XDG_TOPLEVEL_SET_MAXIMIZED,
            Self::UnsetMaximized { .. } => opcode::XDG_TOPLEVEL_UNSET_MAXIMIZED,
            Self::SetFullscreen { .. } => opcode::XDG_TOPLEVEL_SET_FULLSCREEN,
            Self::UnsetFullscreen { .. } => opcode::XDG_TOPLEVEL_UNSET_FULLSCREEN,
            Self::SetMinimized { .. } => opcode::XDG_TOPLEVEL_SET_MINIMIZED,
            Self::SetApplicationId { .. } => opcode::ZAURA_SURFACE_SET_APPLICATION_ID,
        }
    }

    /// Protocol name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetTitle { .. } => "xdg_toplevel.set_title",
            Self::SetMaximized { .. } => "xdg_toplevel.set_maximized",
            Self::UnsetMaximized { .. } => "xdg_toplevel.unset_maximized",
            Self::SetFullscreen { .. } => "xdg_toplevel.set_fullscreen",
            Self::UnsetFullscreen { .. } => "xdg_toplevel.unset_fullscreen",
            Self::SetMinimized { .. } => "xdg_toplevel.set_minimized",
            Self::SetApplicationId { .. } => "zaura_surface.set_application_id",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let builder = MessageBuilder::new(self.target(), self.opcode());
        let builder = match self {
            Self::SetTitle { title, .. } => builder.string(Some(title.as_str())),
            Self::SetFullscreen { .. } => builder.object(None),
            Self::SetApplicationId { app_id, .. } => builder.string(Some(app_id.as_str())),
            Self::SetMaximized { .. }
            | Self::UnsetMaximized { .. }
            | Self::UnsetFullscreen { .. }
            | Self::SetMinimized { .. } => builder,
        };
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Message;

    #[test]
    fn test_set_fullscreen_carries_null_output() {
        let buf = ShellRequest::SetFullscreen { toplevel: 5 }.encode().unwrap();
        let message = Message::parse(&buf).unwrap();
        assert_eq!(message.object_id, 5);
        assert_eq!(message.opcode, opcode::XDG_TOPLEVEL_SET_FULLSCREEN);
        assert_eq!(message.args().object().unwrap(), None);
    }

    #[test]
    fn test_argumentless_requests() {
        for request in [
            ShellRequest::SetMaximized { toplevel: 9 },
            ShellRequest::UnsetMaximized { toplevel: 9 },
            ShellRequest::UnsetFullscreen { toplevel: 9 },
            ShellRequest::SetMinimized { toplevel: 9 },
        ] {
            let buf = request.encode().unwrap();
            let message = Message::parse(&buf).unwrap();
            assert_eq!(message.size(), 8, "{}", request.name());
            assert_eq!(message.opcode, request.opcode());
        }
    }

    #[test]
    fn test_set_application_id() {
        let request = ShellRequest::SetApplicationId {
            aura_surface: 21,
            app_id: "org.chromium.guest.wmclass.xterm".into(),
        };
        let buf = request.encode().unwrap();
        let message = Message::parse(&buf).unwrap();
        assert_eq!(message.object_id, 21);
        assert_eq!(message.opcode, opcode::ZAURA_SURFACE_SET_APPLICATION_ID);
        assert_eq!(
            message.args().string().unwrap(),
            Some("org.chromium.guest.wmclass.xterm")
        );
    }
}
