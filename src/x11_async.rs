//! X11 Async Event Stream
//!
//! Wakes the tokio event loop when the guest X connection becomes readable.
//! A blocking task polls the connection fd with mio and signals a `Notify`.

use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{oneshot, Notify};
use tracing::{info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

const X11_TOKEN: mio::Token = mio::Token(0);

/// Poll timeout, bounds how long shutdown of the polling task takes
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub struct X11EventStream {
    conn: Arc<RustConnection>,
    notify: Arc<Notify>,
    /// Dropping this stops the polling task
    _task_guard: oneshot::Receiver<()>,
}

impl X11EventStream {
    pub fn new(conn: Arc<RustConnection>) -> Result<Self> {
        let fd = conn.stream().as_raw_fd();
        let notify = Arc::new(Notify::new());
        let task_notify = notify.clone();

        let (guard, task_guard) = oneshot::channel::<()>();
        let mut poll = mio::Poll::new().context("Failed to create mio Poll")?;
        let mut events = mio::Events::with_capacity(1);
        poll.registry()
            .register(
                &mut mio::unix::SourceFd(&fd),
                X11_TOKEN,
                mio::Interest::READABLE,
            )
            .context("Failed to register X11 FD with mio")?;

        tokio::task::spawn_blocking(move || loop {
            if guard.is_closed() {
                info!("X11 polling task shutting down");
                return;
            }
            if let Err(err) = poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                warn!("X11 socket poll failed: {:?}", err);
                continue;
            }
            if events.iter().any(|event| event.token() == X11_TOKEN) {
                task_notify.notify_one();
            }
        });

        Ok(Self {
            conn,
            notify,
            _task_guard: task_guard,
        })
    }

    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }

    /// Every event already read from the connection, oldest first
    pub fn pending_events(&self) -> Result<Vec<Event>> {
        let mut pending = Vec::new();
        while let Some(event) = self.conn.poll_for_event()? {
            pending.push(event);
        }
        Ok(pending)
    }

    /// Wait until the X11 fd becomes readable
    pub async fn wait_readable(&self) {
        self.notify.notified().await;
    }

    /// Flush queued X11 requests
    pub fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}
