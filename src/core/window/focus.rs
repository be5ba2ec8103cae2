//! Focus routing.

use crate::core::surface::SurfaceHandle;

/// A focus transition decided at a tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChange {
    pub previous: Option<SurfaceHandle>,
    pub next: Option<SurfaceHandle>,
}

/// Remembers which window id was last broadcast and which surface holds
/// keyboard and pointer focus because of it.
#[derive(Debug, Default)]
pub struct FocusRouter {
    /// Window id last acted on, 0 = none.
    broadcast: u32,
    focused: Option<SurfaceHandle>,
}

impl FocusRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<SurfaceHandle> {
        self.focused
    }

    pub fn broadcast_id(&self) -> u32 {
        self.broadcast
    }

    pub fn has_focus(&self, surface: SurfaceHandle) -> bool {
        self.focused == Some(surface)
    }

    /// Compare the world's focused window id with the last broadcast one.
    ///
    /// `resolve` maps a window id to its live owning surface. Returns `None`
    /// when the id has not changed.
    pub fn update(&mut self, requested: u32, resolve: impl FnOnce(u32) -> Option<SurfaceHandle>) -> Option<FocusChange> {
        if requested == self.broadcast {
            return None;
        }
        let next = if requested == 0 { None } else { resolve(requested) };
        let change = FocusChange { previous: self.focused, next };
        self.broadcast = requested;
        self.focused = next;
        Some(change)
    }

    /// Drop focus without notifying anyone; the surface is gone.
    pub fn forget(&mut self, surface: SurfaceHandle) {
        if self.focused == Some(surface) {
            self.focused = None;
        }
    }
}
