//! Compositor core.
//!
//! `Compositor` owns the surface table, the world window table, the seat and
//! the focus slot. It never touches a socket: protocol handlers call into it
//! with an explicit `&mut` borrow and drain [`Event`]s from its outbox after
//! every dispatch pass and every tick. This keeps the whole state machine
//! testable without a display.

mod surfaces;
mod input;
mod windows;
mod tick;

use crate::core::config::CompositorConfig;
use crate::core::errors::{CoreError, ProtocolError, Result};
use crate::core::event::{ClientKey, Event, SerialCounter};
use crate::core::frame::FrameClock;
use crate::core::handle::HandleTable;
use crate::core::import::{SoftwareTextures, TextureStore};
use crate::core::input::Seat;
use crate::core::surface::{Role, Surface, SurfaceHandle};
use crate::core::window::{FocusRouter, WindowTable};

pub struct Compositor<S: TextureStore = SoftwareTextures> {
    pub(crate) surfaces: HandleTable<Surface>,
    pub(crate) windows: WindowTable,
    pub(crate) seat: Seat,
    pub(crate) focus: FocusRouter,
    textures: S,
    serials: SerialCounter,
    clock: FrameClock,
    events: Vec<Event>,
    /// Ticks completed so far.
    ticks: u64,
}

impl<S: TextureStore> Compositor<S> {
    pub fn new(config: &CompositorConfig, textures: S) -> Self {
        let capacity = &config.capacity;
        tracing::info!(
            "Creating compositor core: {} surfaces, {} windows, {} observers per kind",
            capacity.max_surfaces,
            capacity.max_windows,
            capacity.max_observers
        );
        Self {
            surfaces: HandleTable::with_capacity(capacity.max_surfaces),
            windows: WindowTable::with_capacity(capacity.max_windows),
            seat: Seat::new(capacity.max_observers),
            focus: FocusRouter::new(),
            textures,
            serials: SerialCounter::default(),
            clock: FrameClock::default(),
            events: Vec::new(),
            ticks: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn surface(&self, surface: SurfaceHandle) -> Option<&Surface> {
        self.surfaces.get(surface)
    }

    /// Resolve an external surface id.
    pub fn surface_handle(&self, id: u32) -> Option<SurfaceHandle> {
        self.surfaces.handle_for_id(id)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Surfaces owned by `owner`.
    pub fn surfaces_of(&self, owner: ClientKey) -> Vec<SurfaceHandle> {
        self.surfaces
            .iter()
            .filter(|(_, s)| s.owner == owner)
            .map(|(h, _)| h)
            .collect()
    }

    pub fn windows(&self) -> &WindowTable {
        &self.windows
    }

    pub fn seat(&self) -> &Seat {
        &self.seat
    }

    pub fn focused_surface(&self) -> Option<SurfaceHandle> {
        self.focus.focused()
    }

    pub fn textures(&self) -> &S {
        &self.textures
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Take all pending events (clears the outbox)
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub(crate) fn next_serial(&mut self) -> u32 {
        self.serials.next_serial()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn live_surface(&self, surface: SurfaceHandle) -> Result<&Surface> {
        self.surfaces
            .get(surface)
            .ok_or(CoreError::InvalidSurface(surface.id()))
    }

    fn live_surface_mut(&mut self, surface: SurfaceHandle) -> Result<&mut Surface> {
        self.surfaces
            .get_mut(surface)
            .ok_or(CoreError::InvalidSurface(surface.id()))
    }

    /// A subsurface parent must be live, not the child itself, not a cursor,
    /// and must not already descend from the child.
    fn validate_parent(&self, child: SurfaceHandle, parent: SurfaceHandle) -> std::result::Result<(), ProtocolError> {
        if parent == child {
            return Err(ProtocolError::BadParent("surface cannot be its own parent"));
        }
        let parent_surface = self
            .surfaces
            .get(parent)
            .ok_or(ProtocolError::DefunctSurface(parent.id()))?;
        if parent_surface.effective_role() == Role::Cursor {
            return Err(ProtocolError::BadParent("parent is a cursor surface"));
        }

        let mut next = parent_surface.effective_role().parent();
        let mut steps = 0;
        while let Some(ancestor) = next {
            if ancestor == child {
                return Err(ProtocolError::BadParent("parent is a descendant of the surface"));
            }
            steps += 1;
            if steps > self.surfaces.capacity() {
                break;
            }
            next = self.surfaces.get(ancestor).and_then(|s| s.effective_role().parent());
        }
        Ok(())
    }
}

impl Compositor<SoftwareTextures> {
    /// Core with a CPU texture store honouring the configured budget.
    pub fn with_software_textures(config: &CompositorConfig) -> Self {
        let textures = if config.texture_budget == 0 {
            SoftwareTextures::new()
        } else {
            SoftwareTextures::with_budget(config.texture_budget)
        };
        Self::new(config, textures)
    }
}
