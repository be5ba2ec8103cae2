//! XKB keymap shared with every bound keyboard.
//!
//! Compiled once at startup and kept in an anonymous, sealed file for the
//! lifetime of the process. Clients map it with MAP_PRIVATE.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::io::{AsFd, BorrowedFd, FromRawFd, OwnedFd};

use thiserror::Error;
use xkbcommon::xkb;

use crate::core::config::KeyboardConfig;

#[derive(Error, Debug)]
pub enum KeymapError {
    #[error("xkbcommon could not compile keymap (model {model:?}, layout {layout:?})")]
    Compile { model: String, layout: String },

    #[error("keymap file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct Keymap {
    fd: OwnedFd,
    /// Byte length including the trailing NUL.
    size: u32,
}

impl Keymap {
    /// Compile the keymap named by `config` with xkbcommon.
    pub fn new(config: &KeyboardConfig) -> Result<Self, KeymapError> {
        let context = xkb::Context::new(xkb::CONTEXT_NO_FLAGS);
        let options = (!config.options.is_empty()).then(|| config.options.clone());
        let keymap = xkb::Keymap::new_from_names(
            &context,
            &config.rules,
            &config.model,
            &config.layout,
            &config.variant,
            options,
            xkb::KEYMAP_COMPILE_NO_FLAGS,
        )
        .ok_or_else(|| KeymapError::Compile {
            model: config.model.clone(),
            layout: config.layout.clone(),
        })?;

        let text = keymap.get_as_string(xkb::KEYMAP_FORMAT_TEXT_V1);
        crate::wlog!(crate::util::logging::SEAT, "Generated keymap: {} bytes", text.len());
        Self::from_string(&text)
    }

    /// Wrap already-serialized keymap text.
    pub fn from_string(text: &str) -> Result<Self, KeymapError> {
        let mut file = anonymous_file()?;
        file.write_all(text.as_bytes())?;
        file.write_all(&[0])?;
        file.seek(SeekFrom::Start(0))?;
        seal(&file);
        let size = text.len() as u32 + 1;
        Ok(Self { fd: file.into(), size })
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

impl AsFd for Keymap {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

#[cfg(target_os = "linux")]
fn anonymous_file() -> std::io::Result<File> {
    let name = c"worldcomp-keymap";
    let fd = unsafe { libc::memfd_create(name.as_ptr(), libc::MFD_CLOEXEC | libc::MFD_ALLOW_SEALING) };
    if fd < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(unsafe { File::from_raw_fd(fd) })
}

#[cfg(not(target_os = "linux"))]
fn anonymous_file() -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let path = std::env::temp_dir().join(format!(
        "worldcomp-keymap.{}.{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(&path)?;
    // Unlinked straight away; the fd keeps the contents alive.
    std::fs::remove_file(&path)?;
    Ok(file)
}

#[cfg(target_os = "linux")]
fn seal(file: &File) {
    use std::os::unix::io::AsRawFd;
    let seals = libc::F_SEAL_SHRINK | libc::F_SEAL_GROW | libc::F_SEAL_WRITE | libc::F_SEAL_SEAL;
    if unsafe { libc::fcntl(file.as_raw_fd(), libc::F_ADD_SEALS, seals) } < 0 {
        tracing::warn!("failed to seal keymap memfd: {}", std::io::Error::last_os_error());
    }
}

#[cfg(not(target_os = "linux"))]
fn seal(_file: &File) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn keymap_text_is_nul_terminated() {
        let keymap = Keymap::from_string("xkb_keymap { };").unwrap();
        assert_eq!(keymap.size(), 16);

        let mut file = File::from(keymap.as_fd().try_clone_to_owned().unwrap());
        let mut contents = Vec::new();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"xkb_keymap { };\0");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn keymap_file_is_sealed() {
        let keymap = Keymap::from_string("xkb_keymap { };").unwrap();
        let mut file = File::from(keymap.as_fd().try_clone_to_owned().unwrap());
        assert!(file.write_all(b"x").is_err());
    }
}
