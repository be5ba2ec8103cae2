//! Subsystem-tagged logging.
//!
//! `wlog!` forwards to `tracing` with the subsystem name as the event
//! target, so `RUST_LOG=worldcomp=info,SEAT=debug` style filters work per
//! subsystem.

#[macro_export]
macro_rules! wlog {
    ($module:expr, $($arg:tt)*) => {{
        tracing::debug!(target: $module, $($arg)*);
    }};
}

/// Standardized subsystem identifiers
pub const COMPOSITOR: &str = "COMPOSITOR";
pub const SURFACE: &str = "SURFACE";
pub const BUFFER: &str = "BUFFER";
pub const WINDOW: &str = "WINDOW";
pub const SEAT: &str = "SEAT";
pub const SHELL: &str = "SHELL";
pub const DISPLAY: &str = "DISPLAY";
