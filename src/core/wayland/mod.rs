//! Wayland protocol frontend.
//!
//! Dispatch implementations translate client requests into core operations
//! and turn the core's outbox back into protocol events. Nothing here makes
//! policy decisions.

pub mod state;
pub mod display;
pub mod compositor;
pub mod shm;
pub mod output;
pub mod seat;
pub mod xdg_shell;
pub mod subcompositor;
pub mod data_device;

pub use display::Server;
pub use state::{ClientState, WaylandState};
