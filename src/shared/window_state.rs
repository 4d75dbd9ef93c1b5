//! Per-window state shared by the event handlers and the host request layer

use bitflags::bitflags;

/// Window geometry in guest pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

bitflags! {
    /// Window state flags tracked on both the guest and host side
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WindowFlags: u8 {
        const FULLSCREEN = 1 << 0;
        const MAXIMIZED  = 1 << 1;
        const ICONIFIED  = 1 << 2;
    }
}

impl WindowFlags {
    pub fn fullscreen(self) -> bool {
        self.contains(Self::FULLSCREEN)
    }

    pub fn maximized(self) -> bool {
        self.contains(Self::MAXIMIZED)
    }

    pub fn iconified(self) -> bool {
        self.contains(Self::ICONIFIED)
    }
}
