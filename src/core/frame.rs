//! Frame scheduling.

use std::time::Instant;

use crate::core::event::{CallbackId, Event};
use crate::core::handle::HandleTable;
use crate::core::surface::Surface;

/// Monotonic millisecond clock used for frame-done timestamps.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    epoch: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl FrameClock {
    /// Milliseconds since the clock started. Wraps like the protocol field.
    pub fn now_ms(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }
}

/// Deliver and retire every outstanding frame callback.
///
/// Returns the number of callbacks fired.
pub fn fire_frame_callbacks(surfaces: &mut HandleTable<Surface>, time_ms: u32, events: &mut Vec<Event>) -> usize {
    let mut fired = 0;
    for (_, surface) in surfaces.iter_mut() {
        if let Some(callback) = surface.current.frame.take() {
            events.push(Event::FrameDone { callback, time_ms });
            fired += 1;
        }
    }
    fired
}

/// Stage `callback` on a surface, reporting the one it supersedes.
pub(crate) fn replace_pending(slot: &mut Option<CallbackId>, callback: CallbackId, events: &mut Vec<Event>) {
    if let Some(old) = slot.replace(callback) {
        events.push(Event::FrameDiscarded { callback: old });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::ClientKey;

    #[test]
    fn callbacks_fire_once() {
        let mut surfaces = HandleTable::with_capacity(2);
        let a = surfaces.insert(Surface::new(ClientKey(1))).unwrap();
        surfaces.insert(Surface::new(ClientKey(1))).unwrap();
        surfaces.get_mut(a).unwrap().current.frame = Some(CallbackId(5));

        let mut events = Vec::new();
        assert_eq!(fire_frame_callbacks(&mut surfaces, 42, &mut events), 1);
        assert_eq!(events, vec![Event::FrameDone { callback: CallbackId(5), time_ms: 42 }]);

        events.clear();
        assert_eq!(fire_frame_callbacks(&mut surfaces, 43, &mut events), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn replacing_reports_the_old_callback() {
        let mut slot = None;
        let mut events = Vec::new();
        replace_pending(&mut slot, CallbackId(1), &mut events);
        assert!(events.is_empty());
        replace_pending(&mut slot, CallbackId(2), &mut events);
        assert_eq!(slot, Some(CallbackId(2)));
        assert_eq!(events, vec![Event::FrameDiscarded { callback: CallbackId(1) }]);
    }

    #[test]
    fn clock_is_monotonic() {
        let clock = FrameClock::default();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
