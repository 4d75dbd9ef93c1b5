//! crosswl
//!
//! Window manager core of an X11 → Wayland proxy: mirrors guest X11 window
//! state onto host shell surfaces and converts coordinates between guest
//! pixels and host logical units.

pub mod channel;
pub mod config;
pub mod error;
pub mod shared;
pub mod transform;
pub mod wm;
pub mod x11_async;

pub use error::WmError;
