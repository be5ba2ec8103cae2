//! Core error types

use thiserror::Error;

/// Client protocol violations.
///
/// These are posted back to the offending client by the transport, which
/// then tears that client down. Compositor state stays valid for everyone
/// else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("buffer attached with non-zero offset ({x}, {y})")]
    InvalidOffset { x: i32, y: i32 },

    #[error("surface {surface} already has role {current}, cannot assign {requested}")]
    RoleConflict {
        surface: u32,
        current: &'static str,
        requested: &'static str,
    },

    #[error("invalid subsurface parent: {0}")]
    BadParent(&'static str),

    #[error("unsupported pixel format {0:#x}")]
    InvalidFormat(u32),

    #[error("invalid buffer geometry: {0}")]
    InvalidStride(String),

    #[error("invalid shared memory file descriptor: {0}")]
    InvalidFd(String),

    #[error("seat does not have the {0} capability")]
    MissingCapability(&'static str),

    #[error("surface {0} no longer exists")]
    DefunctSurface(u32),

    #[error("too many {kind} objects bound (limit {capacity})")]
    ObserverLimit { kind: &'static str, capacity: usize },
}

/// Core compositor errors
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{table} table is full (capacity {capacity})")]
    CapacityExhausted { table: &'static str, capacity: usize },

    #[error("Invalid surface ID: {0}")]
    InvalidSurface(u32),

    #[error("Invalid window ID: {0}")]
    InvalidWindow(u32),

    #[error("Texture error: {0}")]
    Texture(String),
}

impl CoreError {
    /// Errors that must stop the process rather than a single client.
    ///
    /// Only the surface and window tables are shared by everyone; a full
    /// observer table is the binding client's problem.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::CapacityExhausted { .. })
    }

    pub fn protocol(&self) -> Option<&ProtocolError> {
        match self {
            CoreError::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_fatal_protocol_is_not() {
        let full = CoreError::CapacityExhausted { table: "window", capacity: 4 };
        assert!(full.is_fatal());
        assert_eq!(full.to_string(), "window table is full (capacity 4)");

        let proto: CoreError = ProtocolError::InvalidOffset { x: 1, y: 0 }.into();
        assert!(!proto.is_fatal());
        assert_eq!(proto.protocol(), Some(&ProtocolError::InvalidOffset { x: 1, y: 0 }));
    }
}
