use crate::core::event::{BufferId, CallbackId, ClientKey};
use crate::core::import::TextureId;
use crate::core::shm::ShmBuffer;
use crate::core::surface::role::Role;
use crate::core::window::WindowHandle;

/// A staged buffer change.
#[derive(Debug, Clone)]
pub enum Attachment {
    Buffer(ShmBuffer),
    /// Attach of a null buffer: unmap the content.
    Detach,
}

/// Scratch state written by requests and consumed by commit.
///
/// Nothing outside commit reads it.
#[derive(Debug, Clone, Default)]
pub struct PendingState {
    pub buffer: Option<Attachment>,
    pub frame: Option<CallbackId>,
    pub role: Option<Role>,
}

impl PendingState {
    pub fn is_empty(&self) -> bool {
        self.buffer.is_none() && self.frame.is_none() && self.role.is_none()
    }
}

/// Committed state, authoritative for rendering.
#[derive(Debug, Clone, Default)]
pub struct CurrentState {
    /// Buffer last committed. Already released: import copies the pixels.
    pub buffer: Option<BufferId>,
    pub texture: Option<TextureId>,
    pub width: i32,
    pub height: i32,
    /// Frame callback waiting for the next tick.
    pub frame: Option<CallbackId>,
    pub role: Role,
}

/// One client drawable.
#[derive(Debug)]
pub struct Surface {
    pub owner: ClientKey,
    pub(crate) pending: PendingState,
    pub(crate) current: CurrentState,
    /// Back-reference into the window table, for toplevel and bridged roles.
    pub(crate) window: Option<WindowHandle>,
    /// A window-shell object (xdg_surface) has been created for this surface.
    pub(crate) shell_attached: bool,
}

impl Surface {
    pub fn new(owner: ClientKey) -> Self {
        Self {
            owner,
            pending: PendingState::default(),
            current: CurrentState::default(),
            window: None,
            shell_attached: false,
        }
    }

    pub fn current(&self) -> &CurrentState {
        &self.current
    }

    pub fn role(&self) -> Role {
        self.current.role
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.current.texture
    }

    pub fn size(&self) -> (i32, i32) {
        (self.current.width, self.current.height)
    }

    pub fn window(&self) -> Option<WindowHandle> {
        self.window
    }

    pub fn has_shell(&self) -> bool {
        self.shell_attached
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Role the surface will have after its next successful commit.
    pub fn effective_role(&self) -> Role {
        match self.pending.role {
            Some(role) if self.current.role.is_none() => role,
            _ => self.current.role,
        }
    }
}
