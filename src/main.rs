//! crosswl - X11 window manager bridging guest windows to a host Wayland shell
//!
//! Becomes the window manager of the guest X server, mirrors window state onto
//! host shell objects and writes the resulting requests to the host channel.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ChangeWindowAttributesAux, ConnectionExt, EventMask, MapState};

use crosswl::channel::{QueuedChannel, SocketSink, WaylandChannel};
use crosswl::config::Config;
use crosswl::shared::window_state::Geometry;
use crosswl::wm::display::DisplayInfo;
use crosswl::wm::events::{EventResult, EventRouter};
use crosswl::wm::hints::X11Properties;
use crosswl::wm::{Atoms, WindowManager};
use crosswl::x11_async::X11EventStream;
use crosswl_proto::Message;

/// Command line options
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    replace: bool,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Args::default();
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--replace" | "-r" => args.replace = true,
                "--config" | "-c" => {
                    let path = iter.next().context("--config needs a path")?;
                    args.config = Some(PathBuf::from(path));
                }
                other => anyhow::bail!("Unknown argument: {}", other),
            }
        }
        Ok(args)
    }
}

struct CrosswlApp {
    x11_stream: X11EventStream,
    wm: WindowManager<QueuedChannel>,
    router: EventRouter,
    /// Host transport; requests are only logged without one
    host: Option<SocketSink>,
}

impl CrosswlApp {
    fn new(config: &Config, replace: bool) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
        let conn = Arc::new(conn);
        info!("Connected to X server (screen {})", screen_num);

        let display = DisplayInfo::acquire(conn.as_ref(), screen_num, replace)?;
        let atoms = Atoms::new(conn.as_ref(), config.identity.app_id_property.as_deref())
            .context("Failed to intern atoms")?;
        atoms.setup_supported(conn.as_ref(), display.root, display.owner_window)?;
        conn.flush()?;

        let host = match &config.channel.socket {
            Some(path) => Some(
                SocketSink::connect(path)
                    .with_context(|| format!("Failed to connect host channel {:?}", path))?,
            ),
            None => {
                warn!("No host channel configured, host requests will only be logged");
                None
            }
        };

        let wm = WindowManager::new(
            display.root,
            atoms,
            config.scale.to_scale_config(),
            config.identity.clone(),
            QueuedChannel::new(),
        );

        let mut app = Self {
            x11_stream: X11EventStream::new(conn)?,
            wm,
            router: EventRouter::new(),
            host,
        };
        app.scan_existing_windows()?;
        Ok(app)
    }

    /// Track windows created before the WM took over, e.g. after `--replace`
    fn scan_existing_windows(&mut self) -> Result<()> {
        let conn = self.x11_stream.connection();
        let tree = conn.query_tree(self.wm.root())?.reply()?;
        info!("Scanning {} existing windows", tree.children.len());

        let props = X11Properties::new(conn);
        let event_mask = EventMask::PROPERTY_CHANGE | EventMask::FOCUS_CHANGE;
        for &window in &tree.children {
            let Ok(attrs) = conn.get_window_attributes(window)?.reply() else {
                continue;
            };
            // Popups, tooltips and our own selection owner window
            if attrs.override_redirect {
                debug!("Skipping override-redirect window 0x{:x}", window);
                continue;
            }
            let Ok(geometry) = conn.get_geometry(window)?.reply() else {
                continue;
            };

            conn.change_window_attributes(
                window,
                &ChangeWindowAttributesAux::new().event_mask(event_mask),
            )?;
            let geometry = Geometry::new(
                i32::from(geometry.x),
                i32::from(geometry.y),
                u32::from(geometry.width),
                u32::from(geometry.height),
            );
            let viewable = attrs.map_state == MapState::VIEWABLE;
            if let Err(e) = self.wm.adopt_window(&props, window, geometry, viewable) {
                warn!("Failed to adopt existing window 0x{:x}: {}", window, e);
            }
        }

        self.flush_host()?;
        info!("Tracking {} windows", self.wm.registry().len());
        Ok(())
    }

    /// Main event loop
    async fn run(mut self) -> Result<()> {
        info!("Starting main event loop");
        loop {
            let events = self
                .x11_stream
                .pending_events()
                .context("X11 connection lost")?;
            let props = X11Properties::new(self.x11_stream.connection());
            let mut ignored = 0;
            for event in &events {
                match self.router.route_event(
                    self.x11_stream.connection(),
                    &mut self.wm,
                    &props,
                    event,
                ) {
                    Ok(EventResult::Handled) => {}
                    Ok(EventResult::Ignore) => ignored += 1,
                    Err(e) => warn!("Failed to route event: {}", e),
                }
            }
            if ignored > 0 {
                debug!("Ignored {} of {} events", ignored, events.len());
            }

            self.flush_host()?;
            self.x11_stream.flush()?;
            self.x11_stream.wait_readable().await;
        }
    }

    /// Hand queued requests to the host transport
    fn flush_host(&mut self) -> Result<()> {
        let messages: Vec<Vec<u8>> = self.wm.channel_mut().drain().collect();
        for message in messages {
            if let Ok(parsed) = Message::parse(&message) {
                debug!(
                    "Host request: object {} opcode {} ({} bytes)",
                    parsed.object_id,
                    parsed.opcode,
                    parsed.size()
                );
            }
            if let Some(host) = &mut self.host {
                host.send(&message).context("Host channel failed")?;
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse()?;
    let config = Config::load(args.config.as_deref())?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting crosswl");
    if args.replace {
        info!("--replace flag detected: will attempt to replace existing WM");
    }

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
            }
            let _ = shutdown_tx.send(()).await;
        });
    }

    let app = CrosswlApp::new(&config, args.replace)?;

    tokio::select! {
        result = app.run() => {
            if let Err(e) = result {
                error!("Application error: {:#}", e);
                return Err(e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
