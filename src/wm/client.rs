use crate::shared::window_state::{Geometry, WindowFlags};
use crate::transform::SurfaceScale;

/// Guest window record
/// One per top-level or override-redirect window seen by the WM
#[derive(Debug, Clone, Default)]
pub struct Client {
    /// X11 window ID
    pub id: u32,

    /// Has the WM taken ownership after a map request?
    pub managed: bool,

    pub override_redirect: bool,

    /// Last requested geometry, in guest pixels
    pub geometry: Geometry,

    /// Most recently requested window state
    pub state: WindowFlags,

    /// State last forwarded to the host
    pub host_state: WindowFlags,

    /// Window title
    pub title: String,

    /// Class name from WM_CLASS
    pub class: Option<String>,

    /// WM_CLIENT_LEADER window
    pub client_leader: Option<u32>,

    /// Application id the guest set on the window itself
    pub app_id_property: Option<String>,

    /// Host xdg_toplevel object, once a shell role is assigned
    pub toplevel: Option<u32>,

    /// Host zaura_surface object
    pub aura_surface: Option<u32>,

    /// Host wl_surface announced through WL_SURFACE_ID
    pub host_surface_id: Option<u32>,

    /// Direct-scale override for the window's surface
    pub surface_scale: SurfaceScale,
}

impl Client {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn has_role(&self) -> bool {
        self.toplevel.is_some()
    }

    /// Drop every host-side association
    pub fn clear_host_objects(&mut self) {
        self.toplevel = None;
        self.aura_surface = None;
        self.host_surface_id = None;
        self.host_state = WindowFlags::empty();
        self.surface_scale.reset();
    }
}
