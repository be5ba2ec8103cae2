// worldcomp
//
// Embedded Wayland compositor for a 3D world. Clients draw into shared
// memory; committed buffers become textures on world windows that the host
// renderer places and focuses.

pub mod core;
pub mod util;
pub mod prelude;
