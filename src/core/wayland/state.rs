//! Protocol-side state.
//!
//! `WaylandState` is the `D` every Dispatch impl is written against. It owns
//! the core [`Compositor`] plus the resource maps needed to turn core
//! [`Event`]s back into protocol events.

use std::collections::HashMap;
use std::os::fd::AsFd;

use wayland_server::backend::{ClientData, ClientId, DisconnectReason, ObjectId};
use wayland_server::protocol::{
    wl_buffer::WlBuffer,
    wl_callback::WlCallback,
    wl_keyboard::{self, WlKeyboard},
    wl_pointer::{self, WlPointer},
    wl_seat,
    wl_shm,
    wl_subcompositor,
    wl_surface::{self, WlSurface},
};
use wayland_server::{Client, Resource};
use wayland_protocols::xdg::shell::server::{
    xdg_surface::XdgSurface,
    xdg_toplevel::{self, XdgToplevel},
};

use crate::core::compositor::Compositor;
use crate::core::config::CompositorConfig;
use crate::core::errors::{CoreError, ProtocolError, Result};
use crate::core::event::{BufferId, CallbackId, ClientKey, Event};
use crate::core::input::{KeyState, Keymap, KeyboardHandle, PointerHandle};
use crate::core::surface::SurfaceHandle;

/// Per-client data attached when the connection is accepted.
#[derive(Debug)]
pub struct ClientState {
    pub key: ClientKey,
}

impl ClientData for ClientState {
    fn initialized(&self, client_id: ClientId) {
        tracing::info!("Client {:?} connected as {:?}", client_id, self.key);
    }

    fn disconnected(&self, client_id: ClientId, reason: DisconnectReason) {
        tracing::info!("Client {:?} ({:?}) disconnected: {:?}", client_id, self.key, reason);
    }
}

/// Key of the client that owns `client`, or the default key for clients
/// that were inserted without [`ClientState`].
pub(crate) fn client_key(client: &Client) -> ClientKey {
    client.get_data::<ClientState>().map(|c| c.key).unwrap_or_default()
}

/// Core handle behind a wl_surface, if it was admitted to the surface table.
pub(crate) fn surface_handle(surface: &WlSurface) -> Option<SurfaceHandle> {
    surface.data::<Option<SurfaceHandle>>().copied().flatten()
}

/// Protocol objects wrapping one core surface.
#[derive(Debug)]
pub(crate) struct SurfaceObjects {
    pub surface: WlSurface,
    pub xdg_surface: Option<XdgSurface>,
    pub toplevel: Option<XdgToplevel>,
    pub title: String,
    pub app_id: String,
}

impl SurfaceObjects {
    fn new(surface: WlSurface) -> Self {
        Self {
            surface,
            xdg_surface: None,
            toplevel: None,
            title: String::new(),
            app_id: String::new(),
        }
    }
}

pub struct WaylandState {
    pub compositor: Compositor,
    pub config: CompositorConfig,
    pub(crate) keymap: Keymap,
    pub(crate) surfaces: HashMap<SurfaceHandle, SurfaceObjects>,
    pub(crate) keyboards: HashMap<KeyboardHandle, WlKeyboard>,
    pub(crate) pointers: HashMap<PointerHandle, WlPointer>,
    pub(crate) buffers: HashMap<BufferId, WlBuffer>,
    pub(crate) callbacks: HashMap<CallbackId, WlCallback>,
    /// Offered mime types per live data source.
    pub(crate) data_sources: HashMap<ObjectId, Vec<String>>,
    pub(crate) selection: Option<ObjectId>,
    next_object: u64,
    next_client: u32,
    /// First fatal error seen while dispatching.
    fatal: Option<CoreError>,
}

impl WaylandState {
    pub fn new(config: CompositorConfig, keymap: Keymap) -> Self {
        let compositor = Compositor::with_software_textures(&config);
        Self {
            compositor,
            config,
            keymap,
            surfaces: HashMap::new(),
            keyboards: HashMap::new(),
            pointers: HashMap::new(),
            buffers: HashMap::new(),
            callbacks: HashMap::new(),
            data_sources: HashMap::new(),
            selection: None,
            next_object: 1,
            next_client: 1,
            fatal: None,
        }
    }

    pub(crate) fn next_client_state(&mut self) -> ClientState {
        let key = ClientKey(self.next_client);
        self.next_client += 1;
        ClientState { key }
    }

    pub(crate) fn next_object_id(&mut self) -> u64 {
        let id = self.next_object;
        self.next_object += 1;
        id
    }

    // =========================================================================
    // Surfaces
    // =========================================================================

    pub(crate) fn track_surface(&mut self, handle: SurfaceHandle, surface: WlSurface) {
        self.surfaces.insert(handle, SurfaceObjects::new(surface));
    }

    pub(crate) fn objects_mut(&mut self, handle: SurfaceHandle) -> Option<&mut SurfaceObjects> {
        self.surfaces.get_mut(&handle)
    }

    /// Title set by the client's toplevel, if any.
    pub fn title(&self, handle: SurfaceHandle) -> Option<&str> {
        self.surfaces.get(&handle).map(|o| o.title.as_str())
    }

    pub fn app_id(&self, handle: SurfaceHandle) -> Option<&str> {
        self.surfaces.get(&handle).map(|o| o.app_id.as_str())
    }

    /// Admit a surface presented through the legacy-protocol bridge as a
    /// world window. It appears on its next commit.
    pub fn admit_bridged_surface(&mut self, surface: &WlSurface) -> Result<()> {
        let handle = surface_handle(surface).ok_or(CoreError::InvalidSurface(0))?;
        self.compositor.admit_bridged(handle)?;
        crate::wlog!(crate::util::logging::WINDOW, "Admitted bridged surface {}", handle.id());
        Ok(())
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// Route a core error raised while handling a request on `resource`.
    ///
    /// Protocol violations are posted on the resource, which disconnects its
    /// client. Fatal errors are latched for [`Self::take_fatal`].
    pub(crate) fn report<R: Resource>(&mut self, resource: &R, err: CoreError) {
        match err {
            CoreError::Protocol(err) => {
                tracing::warn!("Protocol error on {}: {}", resource.id(), err);
                resource.post_error(wire_code(&err), err.to_string());
            }
            err if err.is_fatal() => {
                tracing::error!("Fatal: {}", err);
                self.fatal.get_or_insert(err);
            }
            err => tracing::warn!("Request on {} failed: {}", resource.id(), err),
        }
    }

    pub(crate) fn check<R: Resource, T>(&mut self, resource: &R, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.report(resource, err);
                None
            }
        }
    }

    pub fn take_fatal(&mut self) -> Option<CoreError> {
        self.fatal.take()
    }

    // =========================================================================
    // Outbox
    // =========================================================================

    /// Send every pending core event to its client. Returns how many were
    /// drained.
    pub fn flush_events(&mut self) -> usize {
        let events = self.compositor.take_events();
        let count = events.len();
        for event in events {
            self.send_event(event);
        }
        count
    }

    fn send_event(&mut self, event: Event) {
        match event {
            Event::BufferRelease { buffer } => {
                if let Some(resource) = self.buffers.get(&buffer) {
                    resource.release();
                }
            }
            Event::FrameDone { callback, time_ms } => {
                if let Some(resource) = self.callbacks.remove(&callback) {
                    resource.done(time_ms);
                }
            }
            Event::FrameDiscarded { callback } => {
                self.callbacks.remove(&callback);
            }
            Event::Configure { surface, serial, width, height, activated } => {
                let Some(objects) = self.surfaces.get(&surface) else { return };
                if let Some(toplevel) = &objects.toplevel {
                    let mut states = Vec::new();
                    if activated {
                        states.extend_from_slice(&(xdg_toplevel::State::Activated as u32).to_ne_bytes());
                    }
                    toplevel.configure(width, height, states);
                }
                if let Some(xdg_surface) = &objects.xdg_surface {
                    xdg_surface.configure(serial);
                }
                crate::wlog!(
                    crate::util::logging::SHELL,
                    "Configure surface {} serial={} activated={}",
                    surface.id(),
                    serial,
                    activated
                );
            }
            Event::KeyboardEnter { keyboard, surface, serial } => {
                if let (Some(kb), Some(objects)) = (self.keyboards.get(&keyboard), self.surfaces.get(&surface)) {
                    kb.enter(serial, &objects.surface, Vec::new());
                }
            }
            Event::KeyboardLeave { keyboard, surface, serial } => {
                if let (Some(kb), Some(objects)) = (self.keyboards.get(&keyboard), self.surfaces.get(&surface)) {
                    kb.leave(serial, &objects.surface);
                }
            }
            Event::KeyboardModifiers { keyboard, serial, modifiers } => {
                if let Some(kb) = self.keyboards.get(&keyboard) {
                    kb.modifiers(serial, modifiers.depressed, modifiers.latched, modifiers.locked, modifiers.group);
                }
            }
            Event::KeyboardKey { keyboard, serial, time_ms, key, state } => {
                if let Some(kb) = self.keyboards.get(&keyboard) {
                    let state = match state {
                        KeyState::Pressed => wl_keyboard::KeyState::Pressed,
                        KeyState::Released => wl_keyboard::KeyState::Released,
                    };
                    kb.key(serial, time_ms, key, state);
                }
            }
            Event::PointerEnter { pointer, surface, serial, x, y } => {
                if let (Some(ptr), Some(objects)) = (self.pointers.get(&pointer), self.surfaces.get(&surface)) {
                    ptr.enter(serial, &objects.surface, x, y);
                }
            }
            Event::PointerLeave { pointer, surface, serial } => {
                if let (Some(ptr), Some(objects)) = (self.pointers.get(&pointer), self.surfaces.get(&surface)) {
                    ptr.leave(serial, &objects.surface);
                }
            }
            Event::PointerMotion { pointer, time_ms, x, y } => {
                if let Some(ptr) = self.pointers.get(&pointer) {
                    ptr.motion(time_ms, x, y);
                }
            }
            Event::PointerButton { pointer, serial, time_ms, button, state } => {
                if let Some(ptr) = self.pointers.get(&pointer) {
                    let state = match state {
                        KeyState::Pressed => wl_pointer::ButtonState::Pressed,
                        KeyState::Released => wl_pointer::ButtonState::Released,
                    };
                    ptr.button(serial, time_ms, button, state);
                }
            }
            Event::PointerFrame { pointer } => {
                if let Some(ptr) = self.pointers.get(&pointer).filter(|p| p.version() >= 5) {
                    ptr.frame();
                }
            }
        }
    }

    /// Send keymap and repeat info to a freshly created keyboard.
    pub(crate) fn send_keymap(&self, keyboard: &WlKeyboard) {
        keyboard.keymap(wl_keyboard::KeymapFormat::XkbV1, self.keymap.as_fd(), self.keymap.size());
        if keyboard.version() >= 4 {
            keyboard.repeat_info(self.config.keyboard.repeat_rate, self.config.keyboard.repeat_delay);
        }
        crate::wlog!(crate::util::logging::SEAT, "Sent keymap ({} bytes) to keyboard {}", self.keymap.size(), keyboard.id());
    }
}

/// Wire error code for a protocol violation, as defined by the interface
/// the violation is posted on.
pub(crate) fn wire_code(err: &ProtocolError) -> u32 {
    match err {
        ProtocolError::InvalidOffset { .. } => wl_surface::Error::InvalidOffset.into(),
        // xdg_wm_base.role, wl_pointer.role and wl_subcompositor.bad_surface
        // all use code zero.
        ProtocolError::RoleConflict { .. } => 0,
        ProtocolError::BadParent(_) => wl_subcompositor::Error::BadParent.into(),
        ProtocolError::InvalidFormat(_) => wl_shm::Error::InvalidFormat.into(),
        ProtocolError::InvalidStride(_) => wl_shm::Error::InvalidStride.into(),
        ProtocolError::InvalidFd(_) => wl_shm::Error::InvalidFd.into(),
        ProtocolError::MissingCapability(_) => wl_seat::Error::MissingCapability.into(),
        // Only subsurface parents can go missing under a surface.
        ProtocolError::DefunctSurface(_) => wl_subcompositor::Error::BadParent.into(),
        // Posted on the wl_seat, whose only error code is zero.
        ProtocolError::ObserverLimit { .. } => 0,
    }
}
