//! Types shared between the window manager and the transform engine

pub mod window_state;
