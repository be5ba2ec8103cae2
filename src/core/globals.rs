//! The fixed set of globals advertised at startup.

/// Capability globals and the versions clients are promised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalKind {
    Compositor,
    Output,
    WmBase,
    Seat,
    Subcompositor,
    DataDeviceManager,
    /// Shared-memory buffer factory, bound alongside the six capabilities.
    Shm,
}

impl GlobalKind {
    pub fn interface(self) -> &'static str {
        match self {
            GlobalKind::Compositor => "wl_compositor",
            GlobalKind::Output => "wl_output",
            GlobalKind::WmBase => "xdg_wm_base",
            GlobalKind::Seat => "wl_seat",
            GlobalKind::Subcompositor => "wl_subcompositor",
            GlobalKind::DataDeviceManager => "wl_data_device_manager",
            GlobalKind::Shm => "wl_shm",
        }
    }

    pub fn version(self) -> u32 {
        match self {
            GlobalKind::Compositor => 5,
            GlobalKind::Output => 4,
            GlobalKind::WmBase => 4,
            GlobalKind::Seat => 7,
            GlobalKind::Subcompositor => 1,
            GlobalKind::DataDeviceManager => 3,
            GlobalKind::Shm => 1,
        }
    }
}

/// Published in this order when the server starts.
pub const GLOBALS: [GlobalKind; 7] = [
    GlobalKind::Compositor,
    GlobalKind::Shm,
    GlobalKind::Output,
    GlobalKind::WmBase,
    GlobalKind::Seat,
    GlobalKind::Subcompositor,
    GlobalKind::DataDeviceManager,
];
