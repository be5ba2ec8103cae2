//! Outbound notifications.
//!
//! The core never writes to a client socket. Every notification it wants a
//! client to see is pushed here and drained by the transport after each
//! dispatch pass and each tick, in emission order.

use crate::core::input::{ButtonState, KeyState, KeyboardHandle, Modifiers, PointerHandle};
use crate::core::surface::SurfaceHandle;

/// Transport-assigned identity of a connected client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClientKey(pub u32);

/// Transport-assigned identity of a client buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Transport-assigned identity of a one-shot frame callback object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The compositor no longer reads from this buffer.
    BufferRelease { buffer: BufferId },
    /// Frame completion; the callback object is spent afterwards.
    FrameDone { callback: CallbackId, time_ms: u32 },
    /// A frame callback that was superseded before delivery. Nothing is sent
    /// to the client; the transport only forgets the object.
    FrameDiscarded { callback: CallbackId },
    /// Window-shell configure. Zero size lets the client pick its own.
    Configure {
        surface: SurfaceHandle,
        serial: u32,
        width: i32,
        height: i32,
        activated: bool,
    },
    KeyboardEnter { keyboard: KeyboardHandle, surface: SurfaceHandle, serial: u32 },
    KeyboardLeave { keyboard: KeyboardHandle, surface: SurfaceHandle, serial: u32 },
    KeyboardModifiers { keyboard: KeyboardHandle, serial: u32, modifiers: Modifiers },
    KeyboardKey {
        keyboard: KeyboardHandle,
        serial: u32,
        time_ms: u32,
        key: u32,
        state: KeyState,
    },
    PointerEnter {
        pointer: PointerHandle,
        surface: SurfaceHandle,
        serial: u32,
        x: f64,
        y: f64,
    },
    PointerLeave { pointer: PointerHandle, surface: SurfaceHandle, serial: u32 },
    PointerMotion { pointer: PointerHandle, time_ms: u32, x: f64, y: f64 },
    PointerButton {
        pointer: PointerHandle,
        serial: u32,
        time_ms: u32,
        button: u32,
        state: ButtonState,
    },
    /// Groups the pointer events emitted for one input action.
    PointerFrame { pointer: PointerHandle },
}

impl Event {
    /// Surface referenced by the event, if any.
    pub fn surface(&self) -> Option<SurfaceHandle> {
        match self {
            Event::Configure { surface, .. }
            | Event::KeyboardEnter { surface, .. }
            | Event::KeyboardLeave { surface, .. }
            | Event::PointerEnter { surface, .. }
            | Event::PointerLeave { surface, .. } => Some(*surface),
            _ => None,
        }
    }
}

/// Wrapping serial generator shared by every serial-carrying event.
#[derive(Debug)]
pub struct SerialCounter {
    next: u32,
}

impl Default for SerialCounter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl SerialCounter {
    pub fn next_serial(&mut self) -> u32 {
        let serial = self.next;
        self.next = self.next.wrapping_add(1);
        if self.next == 0 {
            self.next = 1;
        }
        serial
    }

    pub fn current(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serials_skip_zero_on_wrap() {
        let mut serials = SerialCounter { next: u32::MAX };
        assert_eq!(serials.next_serial(), u32::MAX);
        assert_eq!(serials.next_serial(), 1);
        assert_eq!(serials.next_serial(), 2);
    }
}
