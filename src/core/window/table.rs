//! Window bridge: the table the world and renderer read every tick.

use crate::core::errors::{CoreError, Result};
use crate::core::handle::HandleTable;
use crate::core::import::TextureId;
use crate::core::surface::SurfaceHandle;

use super::window::{Placement, WorldWindow};
use super::WindowHandle;

/// Fixed-capacity window records plus the world-chosen focus.
///
/// Slots are never reused: a destroyed window keeps its id, so ids handed to
/// the world stay unambiguous for the whole process lifetime.
#[derive(Debug)]
pub struct WindowTable {
    windows: HandleTable<WorldWindow>,
    /// External id of the window the world wants focused, 0 = none.
    focused: u32,
}

impl WindowTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            windows: HandleTable::with_capacity(capacity),
            focused: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.windows.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.windows.is_full()
    }

    /// Windows ever allocated, destroyed ones included.
    pub fn count(&self) -> usize {
        self.windows.len()
    }

    pub fn live_count(&self) -> usize {
        self.windows.iter().filter(|(_, w)| w.is_valid()).count()
    }

    pub(crate) fn allocate(&mut self, surface: SurfaceHandle, texture: Option<TextureId>) -> Result<WindowHandle> {
        let handle = self
            .windows
            .insert(WorldWindow::new(surface, texture))
            .map_err(|e| CoreError::CapacityExhausted { table: "window", capacity: e.capacity })?;
        tracing::info!("Allocated window {} for surface {:?}", handle.id(), surface);
        Ok(handle)
    }

    pub(crate) fn set_texture(&mut self, window: WindowHandle, texture: Option<TextureId>) {
        if let Some(w) = self.windows.get_mut(window).filter(|w| w.is_valid()) {
            w.texture = texture;
        }
    }

    pub(crate) fn mark_destroyed(&mut self, window: WindowHandle) {
        if let Some(w) = self.windows.get_mut(window) {
            if !w.destroyed {
                tracing::info!("Window {} destroyed", window.id());
            }
            w.destroyed = true;
            w.texture = None;
        }
    }

    pub fn get(&self, window: WindowHandle) -> Option<&WorldWindow> {
        self.windows.get(window)
    }

    pub fn get_by_id(&self, id: u32) -> Option<&WorldWindow> {
        self.windows.handle_for_id(id).and_then(|h| self.windows.get(h))
    }

    /// Owning surface of a live window.
    pub fn surface_for(&self, window: WindowHandle) -> Option<SurfaceHandle> {
        self.windows
            .get(window)
            .filter(|w| w.is_valid())
            .map(|w| w.surface)
    }

    /// External 1-based id of a window handle, if the handle is current.
    pub fn window_id(&self, window: WindowHandle) -> Option<u32> {
        self.windows.contains(window).then(|| window.id())
    }

    pub fn window_from_id(&self, id: u32) -> Option<WindowHandle> {
        self.windows.handle_for_id(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &WorldWindow)> + '_ {
        self.windows.iter().map(|(h, w)| (h.id(), w))
    }

    pub fn focused_id(&self) -> u32 {
        self.focused
    }

    /// Written by the world between ticks.
    pub fn set_focused_id(&mut self, id: u32) {
        self.focused = id;
    }

    /// World-owned placement of window `id`.
    pub fn placement_mut(&mut self, id: u32) -> Option<&mut Placement> {
        let handle = self.windows.handle_for_id(id)?;
        self.windows.get_mut(handle).map(|w| &mut w.placement)
    }
}
