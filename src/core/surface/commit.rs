use crate::core::errors::ProtocolError;
use crate::core::import::PixelFormat;
use crate::core::surface::role::{Role, Transition};
use crate::core::surface::surface::{Attachment, Surface};

/// Everything commit will do, decided before anything is touched.
///
/// Commit is all-or-nothing: building the plan is the only fallible step
/// that depends on the surface alone, so a rejected commit leaves the
/// surface untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitPlan {
    /// Role to move into `current`, if it changes.
    pub role: Option<Role>,
    /// A world window must be allocated together with the role.
    pub allocate_window: bool,
    /// Send a zero-size configure so the client picks its own size.
    pub configure: bool,
}

/// Validate the staged state of `surface` (external id `id`).
pub fn plan_commit(id: u32, surface: &Surface) -> Result<CommitPlan, ProtocolError> {
    let role = match surface.pending.role {
        Some(requested) => match surface.current.role.transition(id, requested)? {
            Transition::Assign(role) => Some(role),
            Transition::Unchanged => None,
        },
        None => None,
    };

    if let Some(Attachment::Buffer(buffer)) = &surface.pending.buffer {
        PixelFormat::from_wl(buffer.format)?;
    }

    let allocate_window = role.map_or(false, |r| r.needs_window()) && surface.window.is_none();

    let attaching = matches!(surface.pending.buffer, Some(Attachment::Buffer(_)));
    let configure = surface.shell_attached && surface.current.buffer.is_none() && !attaching;

    Ok(CommitPlan { role, allocate_window, configure })
}
