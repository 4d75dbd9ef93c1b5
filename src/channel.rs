//! Host Wayland channel
//!
//! The window manager core hands fully encoded requests to a `WaylandChannel`.
//! The binary uses `QueuedChannel`, which buffers requests until the event loop
//! flushes them to the host transport.

use std::collections::VecDeque;
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Outbound connection to the host compositor
pub trait WaylandChannel {
    /// Send one encoded message
    fn send(&mut self, message: &[u8]) -> Result<(), ChannelError>;
}

/// Buffers messages until the owner drains them
#[derive(Debug, Default)]
pub struct QueuedChannel {
    queue: VecDeque<Vec<u8>>,
}

impl QueuedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued message, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl WaylandChannel for QueuedChannel {
    fn send(&mut self, message: &[u8]) -> Result<(), ChannelError> {
        self.queue.push_back(message.to_vec());
        Ok(())
    }
}

/// Writes messages straight to a connected Unix socket
#[derive(Debug)]
pub struct SocketSink {
    stream: UnixStream,
}

impl SocketSink {
    pub fn connect(path: &Path) -> Result<Self, ChannelError> {
        let stream = UnixStream::connect(path)?;
        debug!("Connected host channel at {:?}", path);
        Ok(Self { stream })
    }
}

impl WaylandChannel for SocketSink {
    fn send(&mut self, message: &[u8]) -> Result<(), ChannelError> {
        self.stream.write_all(message)?;
        Ok(())
    }
}
