pub mod errors;
pub mod handle;
pub mod event;
pub mod config;
pub mod shm;
pub mod import;
pub mod surface;
pub mod window;
pub mod input;
pub mod frame;
pub mod globals;
pub mod compositor;
pub mod wayland;

// Re-export key types
pub use compositor::Compositor;
pub use config::CompositorConfig;
pub use errors::{CoreError, ProtocolError};
pub use wayland::{Server, WaylandState};
