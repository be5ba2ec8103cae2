//! Common imports and types used throughout worldcomp.

pub use crate::core::compositor::Compositor;
pub use crate::core::config::CompositorConfig;
pub use crate::core::errors::{CoreError, ProtocolError};
pub use crate::core::event::{BufferId, CallbackId, ClientKey, Event};
pub use crate::core::handle::{Handle, HandleTable};
pub use crate::core::surface::{Role, SurfaceHandle};
pub use crate::core::window::{WindowHandle, WindowTable, WorldWindow};

pub type Result<T> = std::result::Result<T, CoreError>;
