//! Texture storage seam between the compositor and the renderer.

use std::collections::HashMap;

use thiserror::Error;

use super::PixelFormat;

/// Renderer-owned texture name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextureError {
    #[error("texture budget of {0} exhausted")]
    OutOfMemory(usize),

    #[error("unknown texture {0:?}")]
    Unknown(TextureId),

    #[error("upload of {got} bytes does not cover {width}x{height} at stride {stride}")]
    ShortUpload { got: usize, width: u32, height: u32, stride: usize },
}

/// What the importer needs from a renderer.
pub trait TextureStore {
    fn allocate(&mut self, width: u32, height: u32, format: PixelFormat) -> Result<TextureId, TextureError>;

    /// Upload rows of 32-bit pixels, `stride` bytes apart.
    fn upload(&mut self, id: TextureId, bytes: &[u8], stride: usize) -> Result<(), TextureError>;

    fn set_filter(&mut self, id: TextureId, min: Filter, mag: Filter);

    fn release(&mut self, id: TextureId);
}

/// CPU-side texture.
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    /// Tightly packed RGBA8.
    pub rgba: Vec<u8>,
}

impl Texture {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        Some([self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]])
    }
}

/// Software texture store used by the headless host and in tests.
#[derive(Debug, Default)]
pub struct SoftwareTextures {
    textures: HashMap<TextureId, Texture>,
    next_id: u32,
    /// Maximum live textures, 0 = unlimited.
    budget: usize,
    released: usize,
}

impl SoftwareTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(budget: usize) -> Self {
        Self { budget, ..Self::default() }
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    pub fn live(&self) -> usize {
        self.textures.len()
    }

    /// Total number of textures released so far.
    pub fn released(&self) -> usize {
        self.released
    }
}

impl TextureStore for SoftwareTextures {
    fn allocate(&mut self, width: u32, height: u32, format: PixelFormat) -> Result<TextureId, TextureError> {
        if self.budget != 0 && self.textures.len() >= self.budget {
            return Err(TextureError::OutOfMemory(self.budget));
        }
        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(
            id,
            Texture {
                width,
                height,
                format,
                min_filter: Filter::Linear,
                mag_filter: Filter::Linear,
                rgba: vec![0; (width * height * 4) as usize],
            },
        );
        Ok(id)
    }

    fn upload(&mut self, id: TextureId, bytes: &[u8], stride: usize) -> Result<(), TextureError> {
        let texture = self.textures.get_mut(&id).ok_or(TextureError::Unknown(id))?;
        let row_bytes = texture.width as usize * 4;
        let needed = match texture.height as usize {
            0 => 0,
            rows => stride * (rows - 1) + row_bytes,
        };
        if bytes.len() < needed || stride < row_bytes {
            return Err(TextureError::ShortUpload {
                got: bytes.len(),
                width: texture.width,
                height: texture.height,
                stride,
            });
        }

        for row in 0..texture.height as usize {
            let src = &bytes[row * stride..row * stride + row_bytes];
            let dst = &mut texture.rgba[row * row_bytes..(row + 1) * row_bytes];
            for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
                // wl_shm formats are little-endian: bytes are B, G, R, A/X.
                d[0] = s[2];
                d[1] = s[1];
                d[2] = s[0];
                d[3] = if texture.format.has_alpha() { s[3] } else { 0xff };
            }
        }
        Ok(())
    }

    fn set_filter(&mut self, id: TextureId, min: Filter, mag: Filter) {
        if let Some(texture) = self.textures.get_mut(&id) {
            texture.min_filter = min;
            texture.mag_filter = mag;
        }
    }

    fn release(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_some() {
            self.released += 1;
        }
    }
}
