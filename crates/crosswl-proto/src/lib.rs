//! Crosswl wire protocol
//!
//! Encoding of the Wayland messages the proxy sends to the host compositor,
//! shared between the `crosswl` window manager core and its tests.

pub mod shell;
pub mod wire;

pub use shell::{opcode, ShellRequest};
pub use wire::{ArgReader, Fixed, Message, MessageBuilder, WireError, HEADER_SIZE};
