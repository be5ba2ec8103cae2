//! Display lifecycle: socket, globals, client acceptance and the poll loop.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use wayland_protocols::xdg::shell::server::xdg_wm_base::XdgWmBase;
use wayland_server::protocol::{
    wl_compositor::WlCompositor, wl_data_device_manager::WlDataDeviceManager, wl_output::WlOutput,
    wl_seat::WlSeat, wl_shm::WlShm, wl_subcompositor::WlSubcompositor,
};
use wayland_server::{Client, Display, DisplayHandle, ListeningSocket};

use crate::core::config::CompositorConfig;
use crate::core::globals::{GlobalKind, GLOBALS};
use crate::core::input::{ButtonState, KeyState, Keymap};
use crate::core::wayland::state::WaylandState;

pub struct Server {
    display: Display<WaylandState>,
    /// `None` for headless servers that only take inserted clients.
    socket: Option<ListeningSocket>,
    socket_name: Option<String>,
    state: WaylandState,
}

impl Server {
    /// Compile the keymap, open the display, bind the listening socket and
    /// publish the globals.
    pub fn new(config: CompositorConfig) -> Result<Self> {
        let runtime_dir = ensure_runtime_dir()?;
        let socket = ListeningSocket::bind(&config.socket_name)
            .with_context(|| format!("Failed to bind socket {} in {}", config.socket_name, runtime_dir))?;
        let socket_name = socket
            .socket_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.socket_name.clone());

        crate::wlog!(crate::util::logging::DISPLAY, "XDG_RUNTIME_DIR: {}", runtime_dir);
        tracing::info!("Listening on {}/{}", runtime_dir, socket_name);
        tracing::info!("Set WAYLAND_DISPLAY={} to connect clients", socket_name);

        let mut server = Self::headless(config)?;
        server.socket = Some(socket);
        server.socket_name = Some(socket_name);
        Ok(server)
    }

    /// A server without a listening socket. Clients are added with
    /// [`Server::insert_client`].
    pub fn headless(config: CompositorConfig) -> Result<Self> {
        let keymap = Keymap::new(&config.keyboard).with_context(|| {
            format!(
                "Failed to compile keymap (model {}, layout {})",
                config.keyboard.model, config.keyboard.layout
            )
        })?;
        let display = Display::new().context("Failed to create Wayland display")?;
        register_globals(&display.handle());

        Ok(Self {
            display,
            socket: None,
            socket_name: None,
            state: WaylandState::new(config, keymap),
        })
    }

    pub fn socket_name(&self) -> Option<&str> {
        self.socket_name.as_deref()
    }

    pub fn handle(&self) -> DisplayHandle {
        self.display.handle()
    }

    pub fn state(&self) -> &WaylandState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WaylandState {
        &mut self.state
    }

    // =========================================================================
    // Clients
    // =========================================================================

    /// Register a connected stream as a client.
    pub fn insert_client(&mut self, stream: UnixStream) -> Result<Client> {
        let client_state = self.state.next_client_state();
        let key = client_state.key;
        let client = self
            .display
            .handle()
            .insert_client(stream, Arc::new(client_state))
            .context("Failed to insert client")?;
        crate::wlog!(crate::util::logging::DISPLAY, "Inserted client {:?}", key);
        Ok(client)
    }

    /// Accept every pending connection on the listening socket.
    pub fn accept_clients(&mut self) -> Result<usize> {
        let mut accepted = 0;
        loop {
            let Some(socket) = &self.socket else { break };
            let Some(stream) = socket.accept().context("Failed to accept client")? else { break };
            self.insert_client(stream)?;
            accepted += 1;
        }
        Ok(accepted)
    }

    // =========================================================================
    // Event Processing
    // =========================================================================

    /// Process pending client requests, then send what they produced.
    ///
    /// Errors if a fatal condition was raised while handling requests.
    pub fn dispatch(&mut self) -> Result<()> {
        self.display
            .dispatch_clients(&mut self.state)
            .context("Failed to dispatch clients")?;
        self.flush()?;
        if let Some(err) = self.state.take_fatal() {
            return Err(err).context("Fatal compositor error");
        }
        Ok(())
    }

    /// Run one compositor tick and send its events.
    pub fn advance_tick(&mut self) -> Result<()> {
        self.state.compositor.advance_tick();
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.state.flush_events();
        self.display.flush_clients().context("Failed to flush clients")
    }

    // =========================================================================
    // Raw Input
    // =========================================================================

    pub fn deliver_key(&mut self, key: u32, state: KeyState) -> Result<()> {
        self.state.compositor.deliver_key(key, state);
        self.flush()
    }

    pub fn deliver_button(&mut self, button: u32, state: ButtonState) -> Result<()> {
        self.state.compositor.deliver_button(button, state);
        self.flush()
    }

    pub fn deliver_motion(&mut self, x: f64, y: f64) -> Result<()> {
        self.state.compositor.deliver_motion(x, y);
        self.flush()
    }

    pub fn deliver_modifiers(&mut self, depressed: u32, latched: u32, locked: u32, group: u32) -> Result<()> {
        self.state.compositor.deliver_modifiers(depressed, latched, locked, group);
        self.flush()
    }

    // =========================================================================
    // Main Loop
    // =========================================================================

    /// Serve clients until a fatal error occurs.
    pub fn run(&mut self) -> Result<()> {
        let interval = Duration::from_millis(self.state.config.tick_interval_ms);
        let mut next_tick = Instant::now() + interval;
        tracing::info!("Entering main loop (tick every {:?})", interval);

        loop {
            self.wait(next_tick.saturating_duration_since(Instant::now()))?;
            self.accept_clients()?;
            self.dispatch()?;

            let now = Instant::now();
            if now >= next_tick {
                self.advance_tick()?;
                next_tick += interval;
                if next_tick < now {
                    // Fell behind; don't try to catch up with a burst of ticks.
                    next_tick = now + interval;
                }
            }
        }
    }

    /// Block until the display or the socket is readable, or `timeout` passes.
    fn wait(&mut self, timeout: Duration) -> Result<()> {
        let mut fds: Vec<libc::pollfd> = self
            .poll_fds()
            .into_iter()
            .map(|fd| libc::pollfd { fd, events: libc::POLLIN, revents: 0 })
            .collect();
        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;

        // SAFETY: `fds` is a valid, exclusively borrowed array of pollfd.
        let ret = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err).context("poll failed");
            }
        }
        Ok(())
    }

    /// Descriptors the host loop should wait on.
    pub fn poll_fds(&mut self) -> Vec<RawFd> {
        let mut fds = vec![self.display.backend().poll_fd().as_raw_fd()];
        if let Some(socket) = &self.socket {
            fds.push(socket.as_raw_fd());
        }
        fds
    }
}

/// Publish the capability globals in their advertised order.
fn register_globals(handle: &DisplayHandle) {
    for kind in GLOBALS {
        let version = kind.version();
        match kind {
            GlobalKind::Compositor => handle.create_global::<WaylandState, WlCompositor, _>(version, ()),
            GlobalKind::Shm => handle.create_global::<WaylandState, WlShm, _>(version, ()),
            GlobalKind::Output => handle.create_global::<WaylandState, WlOutput, _>(version, ()),
            GlobalKind::WmBase => handle.create_global::<WaylandState, XdgWmBase, _>(version, ()),
            GlobalKind::Seat => handle.create_global::<WaylandState, WlSeat, _>(version, ()),
            GlobalKind::Subcompositor => handle.create_global::<WaylandState, WlSubcompositor, _>(version, ()),
            GlobalKind::DataDeviceManager => handle.create_global::<WaylandState, WlDataDeviceManager, _>(version, ()),
        };
        crate::wlog!(crate::util::logging::DISPLAY, "Registered {} v{}", kind.interface(), version);
    }
}

/// Make sure XDG_RUNTIME_DIR points at a private directory, creating
/// `/tmp/<uid>-runtime` when it is unset or has loose permissions.
fn ensure_runtime_dir() -> Result<String> {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        if let Ok(metadata) = std::fs::metadata(&dir) {
            if metadata.permissions().mode() & 0o777 == 0o700 {
                return Ok(dir);
            }
            tracing::warn!("XDG_RUNTIME_DIR {} has loose permissions, using a private one", dir);
        }
    }

    // SAFETY: getuid has no preconditions.
    let uid = unsafe { libc::getuid() };
    let runtime_dir = format!("/tmp/{}-runtime", uid);
    std::fs::create_dir_all(&runtime_dir).with_context(|| format!("Failed to create {}", runtime_dir))?;
    let mut perms = std::fs::metadata(&runtime_dir)?.permissions();
    perms.set_mode(0o700);
    std::fs::set_permissions(&runtime_dir, perms)?;
    std::env::set_var("XDG_RUNTIME_DIR", &runtime_dir);

    crate::wlog!(crate::util::logging::DISPLAY, "Created XDG_RUNTIME_DIR: {} (mode: 0700)", runtime_dir);
    Ok(runtime_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;

    use wayland_protocols::xdg::shell::server::{xdg_surface::XdgSurface, xdg_toplevel::XdgToplevel};
    use wayland_server::protocol::{wl_buffer::WlBuffer, wl_surface::WlSurface};
    use wayland_server::Resource;

    use crate::core::errors::{CoreError, ProtocolError};
    use crate::core::event::BufferId;
    use crate::core::shm::{MemoryPool, ShmBuffer};
    use crate::core::surface::Role;
    use crate::core::wayland::state::client_key;
    use crate::core::wayland::xdg_shell::XdgSurfaceData;

    /// Wire messages waiting on the client end: (object id, opcode, args).
    fn read_messages(stream: &mut UnixStream) -> Vec<(u32, u16, Vec<u8>)> {
        stream.set_nonblocking(true).unwrap();
        let mut bytes = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => bytes.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => panic!("read failed: {}", e),
            }
        }

        let word = |at: usize| u32::from_ne_bytes(bytes[at..at + 4].try_into().unwrap());
        let mut messages = Vec::new();
        let mut offset = 0;
        while offset + 8 <= bytes.len() {
            let object = word(offset);
            let header = word(offset + 4);
            let size = (header >> 16) as usize;
            messages.push((object, (header & 0xffff) as u16, bytes[offset + 8..offset + size].to_vec()));
            offset += size;
        }
        messages
    }

    fn arg(payload: &[u8], index: usize) -> u32 {
        u32::from_ne_bytes(payload[index * 4..index * 4 + 4].try_into().unwrap())
    }

    #[test]
    fn headless_server_accepts_inserted_clients() {
        let mut server = Server::headless(CompositorConfig::default()).unwrap();
        assert!(server.socket_name().is_none());
        assert_eq!(server.poll_fds().len(), 1);

        let (_client_end, server_end) = UnixStream::pair().unwrap();
        server.insert_client(server_end).unwrap();
        server.dispatch().unwrap();
        server.advance_tick().unwrap();
        assert_eq!(server.state().compositor.ticks(), 1);
    }

    #[test]
    fn outbox_reaches_the_right_objects_in_order() {
        let mut server = Server::headless(CompositorConfig::default()).unwrap();
        let (mut client_end, server_end) = UnixStream::pair().unwrap();
        let client = server.insert_client(server_end).unwrap();
        let dh = server.handle();

        let state = server.state_mut();
        let handle = state.compositor.create_surface(client_key(&client)).unwrap();
        let surface = client.create_resource::<WlSurface, _, WaylandState>(&dh, 1, Some(handle)).unwrap();
        let wm_base = client.create_resource::<XdgWmBase, _, WaylandState>(&dh, 1, ()).unwrap();
        let xdg_surface = client
            .create_resource::<XdgSurface, _, WaylandState>(&dh, 1, XdgSurfaceData { surface: Some(handle), wm_base })
            .unwrap();
        let toplevel = client.create_resource::<XdgToplevel, _, WaylandState>(&dh, 1, Some(handle)).unwrap();
        let buffer = client.create_resource::<WlBuffer, _, WaylandState>(&dh, 1, None::<ShmBuffer>).unwrap();

        state.track_surface(handle, surface);
        let objects = state.objects_mut(handle).unwrap();
        objects.xdg_surface = Some(xdg_surface.clone());
        objects.toplevel = Some(toplevel.clone());
        state.buffers.insert(BufferId(7), buffer.clone());

        state.compositor.attach_shell(handle).unwrap();
        state.compositor.request_role(handle, Role::Toplevel).unwrap();
        state.compositor.commit(handle).unwrap();
        server.flush().unwrap();

        let configure: Vec<(u32, u16)> = read_messages(&mut client_end)
            .into_iter()
            .map(|(object, opcode, _)| (object, opcode))
            .collect();
        // xdg_toplevel.configure, then xdg_surface.configure.
        assert_eq!(configure, vec![(toplevel.id().protocol_id(), 0), (xdg_surface.id().protocol_id(), 0)]);

        let pixels = Arc::new(MemoryPool::new(vec![0u8; 16]));
        let shm = ShmBuffer { id: BufferId(7), offset: 0, width: 2, height: 2, stride: 8, format: 1, source: pixels };
        let state = server.state_mut();
        state.compositor.attach(handle, Some(shm), 0, 0).unwrap();
        state.compositor.commit(handle).unwrap();
        server.flush().unwrap();

        let released: Vec<(u32, u16)> = read_messages(&mut client_end)
            .into_iter()
            .map(|(object, opcode, _)| (object, opcode))
            .collect();
        assert_eq!(released, vec![(buffer.id().protocol_id(), 0)]);
    }

    #[test]
    fn errors_are_posted_on_the_offending_object() {
        let mut server = Server::headless(CompositorConfig::default()).unwrap();
        let (mut client_end, server_end) = UnixStream::pair().unwrap();
        let client = server.insert_client(server_end).unwrap();
        let dh = server.handle();
        let seat = client.create_resource::<WlSeat, _, WaylandState>(&dh, 1, ()).unwrap();

        let state = server.state_mut();
        state.report(&seat, ProtocolError::ObserverLimit { kind: "keyboard", capacity: 64 }.into());
        assert!(state.take_fatal().is_none());
        server.display.flush_clients().ok();

        let messages = read_messages(&mut client_end);
        let (_, opcode, payload) = messages.iter().find(|(object, _, _)| *object == 1).expect("wl_display.error");
        assert_eq!(*opcode, 0);
        assert_eq!(arg(payload, 0), seat.id().protocol_id());
        assert_eq!(arg(payload, 1), 0);

        // Only shared-table exhaustion stops the server.
        let state = server.state_mut();
        state.report(&seat, CoreError::CapacityExhausted { table: "window", capacity: 1 });
        assert!(state.take_fatal().is_some());
    }
}
