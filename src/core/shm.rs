//! Client pixel memory.
//!
//! `ShmPool` maps a client-provided file descriptor; `MemoryPool` is a plain
//! heap-backed source for in-process producers. Both hand out bounded,
//! read-only views through [`PixelSource`].

use std::fmt;
use std::os::unix::io::{AsRawFd, OwnedFd};
use std::sync::{Arc, RwLock};

use crate::core::errors::ProtocolError;
use crate::core::event::BufferId;
use crate::core::import::ImportError;

/// Bounded read access to pixel memory.
pub trait PixelSource: Send + Sync + fmt::Debug {
    /// Size of the addressable range in bytes.
    fn size(&self) -> usize;

    /// Run `f` over `len` bytes starting at `offset`.
    fn read(&self, offset: usize, len: usize, f: &mut dyn FnMut(&[u8])) -> Result<(), ImportError>;
}

struct Mapping {
    ptr: *mut u8,
    size: usize,
}

/// Shared memory pool backed by a client file descriptor.
pub struct ShmPool {
    /// Keeps the fd alive for the lifetime of the mapping.
    fd: OwnedFd,
    mapping: RwLock<Mapping>,
}

// Safety: the mapping is only read, and remapping happens under the write lock.
unsafe impl Send for ShmPool {}
unsafe impl Sync for ShmPool {}

impl ShmPool {
    /// Map `size` bytes of `fd` read-only.
    pub fn new(fd: OwnedFd, size: i32) -> Result<Self, ProtocolError> {
        if size <= 0 {
            return Err(ProtocolError::InvalidStride(format!("pool size {} must be positive", size)));
        }
        let size = size as usize;
        let ptr = map_fd(&fd, size)?;
        tracing::debug!("Mapped SHM pool fd={} size={}", fd.as_raw_fd(), size);
        Ok(Self {
            fd,
            mapping: RwLock::new(Mapping { ptr, size }),
        })
    }

    /// Grow the pool. Pools never shrink.
    pub fn resize(&self, new_size: i32) -> Result<(), ProtocolError> {
        let mut mapping = self
            .mapping
            .write()
            .map_err(|_| ProtocolError::InvalidFd("pool lock poisoned".into()))?;
        if new_size < 0 || (new_size as usize) < mapping.size {
            return Err(ProtocolError::InvalidStride(format!(
                "pool cannot shrink from {} to {}",
                mapping.size, new_size
            )));
        }
        let new_size = new_size as usize;
        if new_size == mapping.size {
            return Ok(());
        }

        let ptr = map_fd(&self.fd, new_size)?;
        // SAFETY: ptr/size describe the mapping created by map_fd.
        unsafe {
            libc::munmap(mapping.ptr as *mut libc::c_void, mapping.size);
        }
        mapping.ptr = ptr;
        mapping.size = new_size;
        tracing::debug!("Resized SHM pool to {} bytes", new_size);
        Ok(())
    }
}

fn map_fd(fd: &OwnedFd, size: usize) -> Result<*mut u8, ProtocolError> {
    // SAFETY: fresh shared read-only mapping of a client fd; validity is checked below.
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            size,
            libc::PROT_READ,
            libc::MAP_SHARED,
            fd.as_raw_fd(),
            0,
        )
    };
    if ptr == libc::MAP_FAILED {
        let err = std::io::Error::last_os_error();
        tracing::error!("Failed to mmap SHM pool (fd={}, size={}): {}", fd.as_raw_fd(), size, err);
        return Err(ProtocolError::InvalidFd(err.to_string()));
    }
    Ok(ptr as *mut u8)
}

impl PixelSource for ShmPool {
    fn size(&self) -> usize {
        self.mapping.read().map(|m| m.size).unwrap_or(0)
    }

    fn read(&self, offset: usize, len: usize, f: &mut dyn FnMut(&[u8])) -> Result<(), ImportError> {
        let mapping = self.mapping.read().map_err(|_| ImportError::Unreadable)?;
        let end = offset.checked_add(len).ok_or(ImportError::OutOfBounds)?;
        if end > mapping.size {
            return Err(ImportError::OutOfBounds);
        }
        // SAFETY: [offset, end) lies inside the live mapping, which cannot be
        // remapped while the read lock is held.
        let bytes = unsafe { std::slice::from_raw_parts(mapping.ptr.add(offset), len) };
        f(bytes);
        Ok(())
    }
}

impl Drop for ShmPool {
    fn drop(&mut self) {
        if let Ok(mapping) = self.mapping.get_mut() {
            // SAFETY: unmapping the region created in new/resize.
            unsafe {
                libc::munmap(mapping.ptr as *mut libc::c_void, mapping.size);
            }
        }
    }
}

impl fmt::Debug for ShmPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShmPool")
            .field("fd", &self.fd.as_raw_fd())
            .field("size", &self.size())
            .finish()
    }
}

/// Heap-backed pixel source.
#[derive(Debug, Default)]
pub struct MemoryPool {
    bytes: RwLock<Vec<u8>>,
}

impl MemoryPool {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: RwLock::new(bytes) }
    }

    /// Overwrite the pool contents, as a client would between frames.
    pub fn write(&self, offset: usize, data: &[u8]) {
        if let Ok(mut bytes) = self.bytes.write() {
            let end = offset + data.len();
            if bytes.len() < end {
                bytes.resize(end, 0);
            }
            bytes[offset..end].copy_from_slice(data);
        }
    }
}

impl PixelSource for MemoryPool {
    fn size(&self) -> usize {
        self.bytes.read().map(|b| b.len()).unwrap_or(0)
    }

    fn read(&self, offset: usize, len: usize, f: &mut dyn FnMut(&[u8])) -> Result<(), ImportError> {
        let bytes = self.bytes.read().map_err(|_| ImportError::Unreadable)?;
        let end = offset.checked_add(len).ok_or(ImportError::OutOfBounds)?;
        let slice = bytes.get(offset..end).ok_or(ImportError::OutOfBounds)?;
        f(slice);
        Ok(())
    }
}

/// A client buffer as seen by the compositor: geometry plus a borrowed view
/// of the client's memory. Ownership stays with the client.
#[derive(Debug, Clone)]
pub struct ShmBuffer {
    pub id: BufferId,
    pub offset: i32,
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    /// Raw wl_shm format code.
    pub format: u32,
    pub source: Arc<dyn PixelSource>,
}

impl ShmBuffer {
    /// Check geometry against the backing pool, as wl_shm_pool.create_buffer requires.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(ProtocolError::InvalidStride(format!(
                "non-positive size {}x{}",
                self.width, self.height
            )));
        }
        if self.offset < 0 {
            return Err(ProtocolError::InvalidStride(format!("negative offset {}", self.offset)));
        }
        let min_stride = self.width as i64 * 4;
        if (self.stride as i64) < min_stride {
            return Err(ProtocolError::InvalidStride(format!(
                "stride {} shorter than {} bytes per row",
                self.stride, min_stride
            )));
        }
        let end = self.offset as i64 + self.stride as i64 * self.height as i64;
        if end > self.source.size() as i64 {
            return Err(ProtocolError::InvalidStride(format!(
                "buffer ends at {} past pool size {}",
                end,
                self.source.size()
            )));
        }
        Ok(())
    }

    /// Bytes covered by the buffer, from its first row to the end of its last.
    pub fn byte_len(&self) -> usize {
        (self.stride as usize) * (self.height as usize - 1) + (self.width as usize) * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(width: i32, height: i32, stride: i32, pool: usize) -> ShmBuffer {
        ShmBuffer {
            id: BufferId(1),
            offset: 0,
            width,
            height,
            stride,
            format: 0,
            source: Arc::new(MemoryPool::new(vec![0; pool])),
        }
    }

    #[test]
    fn geometry_validation() {
        assert!(buffer(4, 4, 16, 64).validate().is_ok());
        assert!(matches!(buffer(4, 4, 12, 64).validate(), Err(ProtocolError::InvalidStride(_))));
        assert!(matches!(buffer(4, 4, 16, 63).validate(), Err(ProtocolError::InvalidStride(_))));
        assert!(matches!(buffer(0, 4, 16, 64).validate(), Err(ProtocolError::InvalidStride(_))));
    }

    #[test]
    fn memory_pool_reads_are_bounded() {
        let pool = MemoryPool::new(vec![1, 2, 3, 4]);
        let mut seen = Vec::new();
        pool.read(1, 2, &mut |b| seen.extend_from_slice(b)).unwrap();
        assert_eq!(seen, vec![2, 3]);
        assert_eq!(pool.read(3, 2, &mut |_| {}), Err(ImportError::OutOfBounds));
    }

    #[test]
    fn byte_len_ignores_trailing_row_padding() {
        let buf = buffer(2, 3, 16, 64);
        assert_eq!(buf.byte_len(), 16 * 2 + 8);
    }
}
