pub mod window;
pub mod table;
pub mod focus;
mod tests;

pub use window::{Placement, WorldWindow};
pub use table::WindowTable;
pub use focus::{FocusChange, FocusRouter};

use crate::core::handle::Handle;

pub type WindowHandle = Handle<WorldWindow>;
