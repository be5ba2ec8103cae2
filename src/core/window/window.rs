use crate::core::import::TextureId;
use crate::core::surface::SurfaceHandle;

/// Where the world put a window. Owned and written by the world; the
/// compositor never reads or writes it after allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: [f32; 3],
    /// Right, up and normal axes of the window plane.
    pub axes: [[f32; 3]; 3],
    pub scale: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            axes: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            scale: 1.0,
        }
    }
}

/// A client window as the world sees it.
///
/// The compositor writes only `texture` and the destroyed flag.
#[derive(Debug, Clone)]
pub struct WorldWindow {
    pub(crate) surface: SurfaceHandle,
    pub(crate) texture: Option<TextureId>,
    pub(crate) destroyed: bool,
    pub placement: Placement,
}

impl WorldWindow {
    pub fn new(surface: SurfaceHandle, texture: Option<TextureId>) -> Self {
        Self {
            surface,
            texture,
            destroyed: false,
            placement: Placement::default(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.destroyed
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }
}
