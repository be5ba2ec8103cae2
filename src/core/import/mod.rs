//! Shared-memory buffer import.
//!
//! Copies a client buffer into a renderer texture synchronously. Once
//! `import` returns the compositor holds no reference to client memory, so
//! the caller releases the buffer back to the client straight away.

pub mod texture;

use thiserror::Error;

use crate::core::errors::ProtocolError;
use crate::core::shm::ShmBuffer;

pub use texture::{Filter, SoftwareTextures, Texture, TextureError, TextureId, TextureStore};

/// wl_shm format codes accepted by the importer.
const WL_SHM_FORMAT_ARGB8888: u32 = 0;
const WL_SHM_FORMAT_XRGB8888: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Argb8888,
    Xrgb8888,
}

impl PixelFormat {
    pub fn from_wl(code: u32) -> Result<Self, ProtocolError> {
        match code {
            WL_SHM_FORMAT_ARGB8888 => Ok(Self::Argb8888),
            WL_SHM_FORMAT_XRGB8888 => Ok(Self::Xrgb8888),
            other => Err(ProtocolError::InvalidFormat(other)),
        }
    }

    pub fn wl_code(self) -> u32 {
        match self {
            Self::Argb8888 => WL_SHM_FORMAT_ARGB8888,
            Self::Xrgb8888 => WL_SHM_FORMAT_XRGB8888,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Argb8888)
    }

    pub const ALL: [PixelFormat; 2] = [PixelFormat::Argb8888, PixelFormat::Xrgb8888];
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("unsupported pixel format {0:#x}")]
    Format(u32),

    #[error("buffer range lies outside its pool")]
    OutOfBounds,

    #[error("pool memory could not be read")]
    Unreadable,

    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Result of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imported {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Upload `buffer` into a fresh nearest-filtered texture.
///
/// On any failure after allocation the new texture is released again, so a
/// failed import leaves the store exactly as it was.
pub fn import(store: &mut dyn TextureStore, buffer: &ShmBuffer) -> Result<Imported, ImportError> {
    let format = PixelFormat::from_wl(buffer.format).map_err(|_| ImportError::Format(buffer.format))?;
    if buffer.validate().is_err() {
        return Err(ImportError::OutOfBounds);
    }
    let width = buffer.width as u32;
    let height = buffer.height as u32;

    let texture = store.allocate(width, height, format)?;

    let mut upload = Ok(());
    let read = buffer.source.read(buffer.offset as usize, buffer.byte_len(), &mut |bytes| {
        upload = store.upload(texture, bytes, buffer.stride as usize);
    });

    if let Err(err) = read.map_err(ImportError::from).and(upload.map_err(ImportError::from)) {
        store.release(texture);
        return Err(err);
    }

    store.set_filter(texture, Filter::Nearest, Filter::Nearest);

    tracing::debug!(
        "Imported buffer {:?} as texture {:?}: {}x{} {:?}",
        buffer.id, texture, width, height, format
    );

    Ok(Imported { texture, width, height })
}
