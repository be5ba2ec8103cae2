//! Window bridge lookups.

use super::*;

use crate::core::window::WindowHandle;

impl<S: TextureStore> Compositor<S> {
    /// Live window owned by `surface`.
    pub fn window_for(&self, surface: SurfaceHandle) -> Option<WindowHandle> {
        let window = self.surfaces.get(surface)?.window?;
        self.windows.get(window).filter(|w| w.is_valid()).map(|_| window)
    }

    /// Owning surface of a live window.
    pub fn surface_for(&self, window: WindowHandle) -> Option<SurfaceHandle> {
        let surface = self.windows.surface_for(window)?;
        self.surfaces.contains(surface).then_some(surface)
    }

    /// The shell object wrapping `surface` went away: the window leaves the
    /// world but the surface keeps its role.
    ///
    /// Before the first commit there is no window yet, so a staged window
    /// role is dropped instead and the next commit maps nothing.
    pub fn unmap_window(&mut self, surface: SurfaceHandle) -> Result<()> {
        let target = self.live_surface_mut(surface)?;
        let Some(window) = target.window else {
            if target.pending.role.map_or(false, |r| r.needs_window()) {
                target.pending.role = None;
                crate::wlog!(crate::util::logging::WINDOW, "Surface {} unmapped before its first commit", surface.id());
            }
            return Ok(());
        };
        if self.focus.has_focus(surface) {
            self.send_focus_leave(surface);
            self.focus.forget(surface);
        }
        self.windows.mark_destroyed(window);
        Ok(())
    }

    /// Window table for the world to write focus and placement into between
    /// ticks.
    pub fn world_mut(&mut self) -> &mut WindowTable {
        &mut self.windows
    }
}
