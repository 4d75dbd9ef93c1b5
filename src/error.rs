//! Window manager errors

use crosswl_proto::WireError;
use thiserror::Error;

use crate::channel::ChannelError;

#[derive(Debug, Error)]
pub enum WmError {
    #[error("window {0:#x} is already registered")]
    DuplicateWindow(u32),

    #[error("host channel: {0}")]
    Channel(#[from] ChannelError),

    #[error("encoding host request: {0}")]
    Wire(#[from] WireError),
}
