//! EWMH (Extended Window Manager Hints) implementation
//!
//! Interned atoms and the root-window properties the WM advertises.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::wrapper::ConnectionExt as _;

/// Holds all interned atoms the WM reacts to
#[derive(Debug, Clone)]
pub struct Atoms {
    pub wm_name: Atom,
    pub wm_class: Atom,
    pub wm_client_leader: Atom,
    pub wm_normal_hints: Atom,
    pub wm_hints: Atom,
    pub wm_change_state: Atom,
    pub net_supported: Atom,
    pub net_supporting_wm_check: Atom,
    pub net_active_window: Atom,
    pub net_wm_name: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_fullscreen: Atom,
    pub net_wm_state_maximized_vert: Atom,
    pub net_wm_state_maximized_horz: Atom,
    pub net_wm_moveresize: Atom,
    pub motif_wm_hints: Atom,
    pub gtk_theme_variant: Atom,
    pub utf8_string: Atom,
    /// Announces the host wl_surface of a window
    pub wl_surface_id: Atom,
    /// Configured per-window application id property
    pub app_id: Option<Atom>,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new<C: Connection>(conn: &C, app_id_property: Option<&str>) -> Result<Self> {
        Self::intern_with(app_id_property, |name| {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        })
    }

    /// Build the atom table from any name → atom mapping
    pub fn intern_with<F>(app_id_property: Option<&str>, mut intern: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Atom>,
    {
        let app_id = match app_id_property {
            Some(name) => Some(intern(name)?),
            None => None,
        };

        Ok(Self {
            wm_name: intern("WM_NAME")?,
            wm_class: intern("WM_CLASS")?,
            wm_client_leader: intern("WM_CLIENT_LEADER")?,
            wm_normal_hints: intern("WM_NORMAL_HINTS")?,
            wm_hints: intern("WM_HINTS")?,
            wm_change_state: intern("WM_CHANGE_STATE")?,
            net_supported: intern("_NET_SUPPORTED")?,
            net_supporting_wm_check: intern("_NET_SUPPORTING_WM_CHECK")?,
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            net_wm_state: intern("_NET_WM_STATE")?,
            net_wm_state_fullscreen: intern("_NET_WM_STATE_FULLSCREEN")?,
            net_wm_state_maximized_vert: intern("_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_maximized_horz: intern("_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_wm_moveresize: intern("_NET_WM_MOVERESIZE")?,
            motif_wm_hints: intern("_MOTIF_WM_HINTS")?,
            gtk_theme_variant: intern("_GTK_THEME_VARIANT")?,
            utf8_string: intern("UTF8_STRING")?,
            wl_surface_id: intern("WL_SURFACE_ID")?,
            app_id,
        })
    }

    /// Advertise supported hints and the WM check window on root
    pub fn setup_supported<C: Connection>(
        &self,
        conn: &C,
        root: Window,
        check_window: Window,
    ) -> Result<()> {
        let supported = [
            self.net_supported,
            self.net_supporting_wm_check,
            self.net_active_window,
            self.net_wm_name,
            self.net_wm_state,
            self.net_wm_state_fullscreen,
            self.net_wm_state_maximized_vert,
            self.net_wm_state_maximized_horz,
            self.net_wm_moveresize,
        ];

        conn.change_property32(
            PropMode::REPLACE,
            root,
            self.net_supported,
            AtomEnum::ATOM,
            &supported,
        )?;

        for window in [root, check_window] {
            conn.change_property32(
                PropMode::REPLACE,
                window,
                self.net_supporting_wm_check,
                AtomEnum::WINDOW,
                &[check_window],
            )?;
        }
        conn.change_property8(
            PropMode::REPLACE,
            check_window,
            self.net_wm_name,
            self.utf8_string,
            b"crosswl",
        )?;

        Ok(())
    }

    /// Update _NET_ACTIVE_WINDOW
    pub fn update_active_window<C: Connection>(
        &self,
        conn: &C,
        root: Window,
        window: Option<u32>,
    ) -> Result<()> {
        let win = window.unwrap_or(0);
        conn.change_property32(
            PropMode::REPLACE,
            root,
            self.net_active_window,
            AtomEnum::WINDOW,
            &[win],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_with_optional_app_id() {
        let mut names = Vec::new();
        let atoms = Atoms::intern_with(Some("_CROSVM_APP_ID"), |name| {
            names.push(name.to_string());
            Ok(names.len() as Atom)
        })
        .unwrap();

        assert_eq!(names[0], "_CROSVM_APP_ID");
        assert_eq!(atoms.app_id, Some(1));
        assert_eq!(atoms.wl_surface_id, names.len() as Atom);

        let atoms = Atoms::intern_with(None, |_| Ok(1)).unwrap();
        assert_eq!(atoms.app_id, None);
    }
}
