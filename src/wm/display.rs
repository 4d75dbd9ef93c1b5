//! Display Module
//!
//! Takes the window manager role on a guest X screen: owns the ICCCM
//! `WM_S<n>` selection and SubstructureRedirect on the root window.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

/// How long to wait for a replaced WM to let go
const REPLACE_TIMEOUT: Duration = Duration::from_secs(15);

/// Screen the WM runs on
#[derive(Debug, Clone, Copy)]
pub struct DisplayInfo {
    pub root: Window,
    /// Window owning the `WM_S<n>` selection, kept for the WM's lifetime
    pub owner_window: Window,
}

impl DisplayInfo {
    /// Become the window manager of `screen_num`
    ///
    /// With `replace`, an existing WM is asked to exit by taking its selection.
    pub fn acquire<C: Connection>(conn: &C, screen_num: usize, replace: bool) -> Result<Self> {
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .with_context(|| format!("Screen {} does not exist", screen_num))?;
        let root = screen.root;
        info!("Acquiring window manager role on screen {} (replace={})", screen_num, replace);

        let wm_selection_name = format!("WM_S{}", screen_num);
        let wm_selection_atom = conn
            .intern_atom(false, wm_selection_name.as_bytes())?
            .reply()
            .context("Failed to intern WM selection atom")?
            .atom;

        let current_owner = conn
            .get_selection_owner(wm_selection_atom)?
            .reply()
            .context("Failed to get current WM selection owner")?
            .owner;
        debug!("WM: Current selection owner: 0x{:x}", current_owner);

        if current_owner != 0 {
            if !replace {
                anyhow::bail!(
                    "Another window manager is already running (window 0x{:x}). \
                    Use --replace to attempt to replace it.",
                    current_owner
                );
            }
            info!("Existing WM detected (window 0x{:x}), attempting replace...", current_owner);
            let _ = conn.change_window_attributes(
                current_owner,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
            );
        }

        let owner_window = conn.generate_id()?;
        conn.create_window(
            screen.root_depth,
            owner_window,
            root,
            -1000,
            -1000,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new()
                .override_redirect(1)
                .event_mask(EventMask::STRUCTURE_NOTIFY),
        )?;

        conn.set_selection_owner(owner_window, wm_selection_atom, x11rb::CURRENT_TIME)?
            .check()
            .context("Failed to set WM selection owner")?;

        let owner_after = conn
            .get_selection_owner(wm_selection_atom)?
            .reply()
            .context("Failed to verify WM selection ownership")?
            .owner;
        if owner_after != owner_window {
            anyhow::bail!(
                "Failed to acquire WM selection ownership (expected 0x{:x}, got 0x{:x})",
                owner_window,
                owner_after
            );
        }

        if current_owner != 0 {
            Self::wait_for_exit(conn, current_owner)?;
        }

        let root_attrs = conn
            .get_window_attributes(root)?
            .reply()
            .context("Failed to get root window attributes")?;
        let required_mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::PROPERTY_CHANGE
            | EventMask::FOCUS_CHANGE;
        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().event_mask(root_attrs.your_event_mask | required_mask),
        )?
        .check()
        .context("Failed to select events on root window - is another WM running?")?;
        conn.flush()?;

        info!("Window manager role acquired (owner window 0x{:x})", owner_window);
        Ok(Self {
            root,
            owner_window,
        })
    }

    fn wait_for_exit<C: Connection>(conn: &C, previous: Window) -> Result<()> {
        info!("Waiting for previous WM to exit...");
        let start = Instant::now();
        while start.elapsed() < REPLACE_TIMEOUT {
            conn.flush()?;
            if conn.get_window_attributes(previous)?.reply().is_err() {
                info!("Previous WM exited");
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        warn!("Timeout waiting for previous WM to exit, proceeding anyway");
        Ok(())
    }
}
