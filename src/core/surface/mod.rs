pub mod surface;
pub mod role;
pub mod commit;

pub use surface::{Attachment, CurrentState, PendingState, Surface};
pub use role::{Role, Transition};
pub use commit::{plan_commit, CommitPlan};

use crate::core::handle::Handle;

pub type SurfaceHandle = Handle<Surface>;

#[cfg(test)]
mod tests;
