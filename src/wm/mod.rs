//! Window Manager Module
//!
//! Tracks guest windows and mirrors their state onto host shell objects.
//! Handlers are synchronous reducers: each event updates the window record
//! and sends zero or more encoded requests through the host channel.

pub mod app_id;
pub mod client;
pub mod display;
pub mod events;
pub mod ewmh;
pub mod hints;
pub mod netwm;
pub mod registry;

use crosswl_proto::ShellRequest;
use tracing::{debug, info};

use crate::channel::WaylandChannel;
use crate::config::IdentityConfig;
use crate::error::WmError;
use crate::shared::window_state::{Geometry, WindowFlags};
use crate::transform::{self, ScaleConfig, Size};
use crate::wm::events::GuestEvent;
use crate::wm::hints::PropertySource;
use crate::wm::netwm::StateRequest;
use crate::wm::registry::WindowRegistry;
pub use ewmh::Atoms;

pub struct WindowManager<C: WaylandChannel> {
    root: u32,
    atoms: Atoms,
    scale: ScaleConfig,
    identity: IdentityConfig,
    registry: WindowRegistry,
    channel: C,
    focused: Option<u32>,
}

impl<C: WaylandChannel> WindowManager<C> {
    pub fn new(
        root: u32,
        atoms: Atoms,
        scale: ScaleConfig,
        identity: IdentityConfig,
        channel: C,
    ) -> Self {
        info!("Window manager ready (root 0x{:x}, scale {:?})", root, scale);
        Self {
            root,
            atoms,
            scale,
            identity,
            registry: WindowRegistry::new(),
            channel,
            focused: None,
        }
    }

    pub fn root(&self) -> u32 {
        self.root
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    pub fn scale(&self) -> &ScaleConfig {
        &self.scale
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn focused(&self) -> Option<u32> {
        self.focused
    }

    /// Dispatch one decoded guest event
    pub fn handle_event<P: PropertySource>(
        &mut self,
        props: &P,
        event: GuestEvent,
    ) -> Result<(), WmError> {
        match event {
            GuestEvent::Create {
                window,
                override_redirect,
                geometry,
            } => self.create_window(window, override_redirect, geometry),
            GuestEvent::Destroy { window } => {
                self.destroy_window(window);
                Ok(())
            }
            GuestEvent::Reparent { window, parent } => self.reparent_window(window, parent),
            GuestEvent::MapRequest { window } => self.map_request(props, window),
            GuestEvent::Unmap { window } => {
                self.unmap_window(window);
                Ok(())
            }
            GuestEvent::ConfigureRequest {
                window,
                x,
                y,
                width,
                height,
            } => {
                self.configure_request(window, x, y, width, height);
                Ok(())
            }
            GuestEvent::FocusIn { window } => self.focus_in(window),
            GuestEvent::PropertyNotify { window, atom, .. } => {
                self.property_changed(props, window, atom)
            }
            GuestEvent::ClientMessage {
                window,
                message_type,
                data,
            } => self.handle_client_message(window, message_type, &data),
        }
    }

    pub fn create_window(
        &mut self,
        id: u32,
        override_redirect: bool,
        geometry: Geometry,
    ) -> Result<(), WmError> {
        let client = self.registry.create(id)?;
        client.override_redirect = override_redirect;
        client.geometry = geometry;
        debug!("Created window 0x{:x} (override_redirect={})", id, override_redirect);
        Ok(())
    }

    pub fn destroy_window(&mut self, id: u32) {
        if self.registry.destroy(id).is_some() {
            debug!("Destroyed window 0x{:x}", id);
            if self.focused == Some(id) {
                self.focused = None;
            }
        }
    }

    /// Windows moved under root become top-level; anything reparented
    /// elsewhere is embedded and no longer tracked.
    pub fn reparent_window(&mut self, id: u32, parent: u32) -> Result<(), WmError> {
        if parent == self.root {
            if !self.registry.contains(id) {
                self.create_window(id, false, Geometry::default())?;
            }
        } else {
            self.destroy_window(id);
        }
        Ok(())
    }

    /// Take ownership of a window the guest wants mapped.
    ///
    /// A window seen for the first time here gets a record.
    pub fn map_request<P: PropertySource>(&mut self, props: &P, id: u32) -> Result<(), WmError> {
        if !self.registry.contains(id) {
            debug!("MapRequest for untracked window 0x{:x}, adopting it", id);
            self.create_window(id, false, Geometry::default())?;
        }
        let atoms = &self.atoms;
        let Some(client) = self.registry.get_mut(id) else {
            return Ok(());
        };

        client.managed = true;
        client.title = read_title(props, atoms, id);
        client.class = props.class(id);
        client.client_leader = props.window(id, atoms.wm_client_leader);
        if let Some(atom) = atoms.app_id {
            client.app_id_property = props.text(id, atom);
        }
        debug!("Managing window 0x{:x} ({:?})", id, client.title);

        self.update_application_id(id)
    }

    /// Track a window that existed before the WM started.
    ///
    /// Viewable windows are managed right away; the rest wait for their
    /// MapRequest.
    pub fn adopt_window<P: PropertySource>(
        &mut self,
        props: &P,
        id: u32,
        geometry: Geometry,
        viewable: bool,
    ) -> Result<(), WmError> {
        self.create_window(id, false, geometry)?;
        if viewable {
            self.map_request(props, id)?;
        }
        Ok(())
    }

    pub fn unmap_window(&mut self, id: u32) {
        if let Some(client) = self.registry.get_mut(id) {
            client.managed = false;
            client.clear_host_objects();
            debug!("Unmapped window 0x{:x}", id);
        }
    }

    pub fn configure_request(
        &mut self,
        id: u32,
        x: Option<i32>,
        y: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
    ) {
        let scale = self.scale;
        let Some(client) = self.registry.get_mut(id) else {
            return;
        };

        let geometry = &mut client.geometry;
        geometry.x = x.unwrap_or(geometry.x);
        geometry.y = y.unwrap_or(geometry.y);
        geometry.width = width.unwrap_or(geometry.width);
        geometry.height = height.unwrap_or(geometry.height);

        if scale.is_direct() && client.has_role() {
            let pixels = pixel_size(&client.geometry);
            transform::try_window_scale(&scale, &mut client.surface_scale, pixels);
        }
    }

    pub fn focus_in(&mut self, id: u32) -> Result<(), WmError> {
        let Some(client) = self.registry.get_mut(id) else {
            return Ok(());
        };
        self.focused = Some(id);

        if client.state.iconified() {
            client.state.remove(WindowFlags::ICONIFIED);
            debug!("Deiconified window 0x{:x}", id);
            return self.forward_state(id);
        }
        Ok(())
    }

    pub fn property_changed<P: PropertySource>(
        &mut self,
        props: &P,
        id: u32,
        atom: u32,
    ) -> Result<(), WmError> {
        let atoms = &self.atoms;
        let Some(client) = self.registry.get_mut(id) else {
            return Ok(());
        };

        if atom == atoms.wm_name || atom == atoms.net_wm_name {
            let title = read_title(props, atoms, id);
            if title == client.title {
                return Ok(());
            }
            client.title = title;
            if let Some(toplevel) = client.toplevel {
                let title = client.title.clone();
                return self.send(ShellRequest::SetTitle { toplevel, title });
            }
        } else if atom == atoms.wm_class {
            client.class = props.class(id);
            if client.managed {
                return self.update_application_id(id);
            }
        } else if Some(atom) == atoms.app_id {
            client.app_id_property = props.text(id, atom);
            if client.managed {
                return self.update_application_id(id);
            }
        } else if atom == atoms.wm_client_leader {
            client.client_leader = props.window(id, atom);
        } else if [
            atoms.wm_normal_hints,
            atoms.wm_hints,
            atoms.motif_wm_hints,
            atoms.gtk_theme_variant,
        ]
        .contains(&atom)
        {
            debug!("Hint property {} changed on window 0x{:x}", atom, id);
        }
        Ok(())
    }

    pub fn handle_client_message(
        &mut self,
        id: u32,
        message_type: u32,
        data: &[u32; 5],
    ) -> Result<(), WmError> {
        let atoms = &self.atoms;
        if !self.registry.contains(id) {
            return Ok(());
        }

        if message_type == atoms.net_wm_state {
            self.handle_net_wm_state(id, data)
        } else if message_type == atoms.wm_change_state {
            self.handle_wm_change_state(id, data)
        } else if message_type == atoms.wl_surface_id {
            if let Some(client) = self.registry.get_mut(id) {
                client.host_surface_id = Some(data[0]);
                debug!("Window 0x{:x} is host surface {}", id, data[0]);
            }
            Ok(())
        } else if message_type == atoms.net_active_window || message_type == atoms.net_wm_moveresize {
            debug!("Client message {} on window 0x{:x} needs a host seat", message_type, id);
            Ok(())
        } else {
            Ok(())
        }
    }

    /// Apply a `_NET_WM_STATE` request and forward changed axes
    pub fn handle_net_wm_state(&mut self, id: u32, data: &[u32; 5]) -> Result<(), WmError> {
        let Some(request) = StateRequest::decode(&self.atoms, data) else {
            debug!("Unknown _NET_WM_STATE action {} on window 0x{:x}", data[0], id);
            return Ok(());
        };
        let Some(client) = self.registry.get_mut(id) else {
            return Ok(());
        };

        client.state = request.apply(client.state);
        if client.state.iconified() {
            debug!("Window 0x{:x} is iconified, holding back {:?}", id, client.state);
            return Ok(());
        }
        self.forward_state(id)
    }

    #[cfg(feature = "iconify")]
    fn handle_wm_change_state(&mut self, id: u32, data: &[u32; 5]) -> Result<(), WmError> {
        if data[0] != netwm::ICONIC_STATE {
            return Ok(());
        }
        let Some(client) = self.registry.get_mut(id) else {
            return Ok(());
        };
        client.state.insert(WindowFlags::ICONIFIED);
        self.forward_state(id)
    }

    #[cfg(not(feature = "iconify"))]
    fn handle_wm_change_state(&mut self, id: u32, _data: &[u32; 5]) -> Result<(), WmError> {
        debug!("Ignoring WM_CHANGE_STATE on window 0x{:x}", id);
        Ok(())
    }

    /// Attach the host xdg_toplevel created for `id`.
    ///
    /// The current state counts as already known to the host.
    pub fn assign_role(&mut self, id: u32, toplevel: u32) {
        if let Some(client) = self.registry.get_mut(id) {
            client.toplevel = Some(toplevel);
            client.host_state = client.state;
            debug!("Window 0x{:x} has toplevel {}", id, toplevel);
        }
    }

    /// Attach the host zaura_surface created for `id`
    pub fn assign_aura_surface(&mut self, id: u32, aura_surface: u32) -> Result<(), WmError> {
        let Some(client) = self.registry.get_mut(id) else {
            return Ok(());
        };
        client.aura_surface = Some(aura_surface);
        if client.managed {
            return self.update_application_id(id);
        }
        Ok(())
    }

    /// Send the resolved application id to the window's aura surface
    pub fn update_application_id(&mut self, id: u32) -> Result<(), WmError> {
        let Some(client) = self.registry.get(id) else {
            return Ok(());
        };
        let Some(aura_surface) = client.aura_surface else {
            return Ok(());
        };
        let app_id = app_id::resolve_application_id(&self.identity, client);
        self.send(ShellRequest::SetApplicationId {
            aura_surface,
            app_id,
        })
    }

    /// Logical size of the window's surface on the host
    pub fn logical_size(&self, id: u32) -> Option<Size> {
        let client = self.registry.get(id)?;
        Some(transform::viewport_size(
            &self.scale,
            Some(&client.surface_scale),
            1.0,
            pixel_size(&client.geometry),
        ))
    }

    /// Bring the host in line with the recorded state
    fn forward_state(&mut self, id: u32) -> Result<(), WmError> {
        let Some(client) = self.registry.get_mut(id) else {
            return Ok(());
        };
        let Some(toplevel) = client.toplevel else {
            debug!("Window 0x{:x} has no role, recorded {:?}", id, client.state);
            return Ok(());
        };

        // host_state only records what actually reached the channel
        let requests = netwm::sync_requests(toplevel, client.host_state, client.state);
        for (axis, request) in requests {
            self.send(request)?;
            if let Some(client) = self.registry.get_mut(id) {
                let value = client.state.contains(axis);
                client.host_state.set(axis, value);
            }
        }
        if let Some(client) = self.registry.get_mut(id) {
            client.host_state = client.state;
        }
        Ok(())
    }

    fn send(&mut self, request: ShellRequest) -> Result<(), WmError> {
        debug!("-> {} on {}", request.name(), request.target());
        let message = request.encode()?;
        self.channel.send(&message)?;
        Ok(())
    }
}

fn pixel_size(geometry: &Geometry) -> Size {
    Size::new(
        i32::try_from(geometry.width).unwrap_or(i32::MAX),
        i32::try_from(geometry.height).unwrap_or(i32::MAX),
    )
}

/// `_NET_WM_NAME`, falling back to `WM_NAME`
fn read_title<P: PropertySource>(props: &P, atoms: &Atoms, id: u32) -> String {
    props
        .text(id, atoms.net_wm_name)
        .or_else(|| props.text(id, atoms.wm_name))
        .unwrap_or_default()
}
