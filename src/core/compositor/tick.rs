//! Per-tick work: focus routing, then frame callbacks.

use super::*;

use crate::core::frame::fire_frame_callbacks;
use crate::core::window::FocusChange;

impl<S: TextureStore> Compositor<S> {
    /// Run one compositor tick and hand back the window table.
    pub fn advance_tick(&mut self) -> &WindowTable {
        self.route_focus();

        let time_ms = self.clock.now_ms();
        let fired = fire_frame_callbacks(&mut self.surfaces, time_ms, &mut self.events);
        if fired > 0 {
            tracing::trace!("Tick {}: {} frame callbacks done at {}ms", self.ticks, fired, time_ms);
        }

        self.ticks += 1;
        &self.windows
    }

    /// React to the world's focused-window id if it changed since last tick.
    fn route_focus(&mut self) {
        let requested = self.windows.focused_id();
        let windows = &self.windows;
        let surfaces = &self.surfaces;
        let change = self.focus.update(requested, |id| {
            let window = windows.window_from_id(id)?;
            windows.surface_for(window).filter(|s| surfaces.contains(*s))
        });

        let Some(FocusChange { previous, next }) = change else { return };
        if previous == next {
            return;
        }
        tracing::info!(
            "Focus: window {} -> surface {:?} (was {:?})",
            requested,
            next.map(|s| s.id()),
            previous.map(|s| s.id())
        );

        if let Some(previous) = previous {
            self.send_focus_leave(previous);
        }
        if let Some(next) = next {
            self.send_focus_enter(next);
        }
    }

    pub(crate) fn send_focus_leave(&mut self, surface: SurfaceHandle) {
        let Some(state) = self.surfaces.get(surface) else { return };
        let owner = state.owner;
        let toplevel = state.role() == Role::Toplevel && state.has_shell();

        let serial = self.next_serial();
        for keyboard in self.seat.keyboards_of(owner) {
            self.events.push(Event::KeyboardLeave { keyboard, surface, serial });
        }
        for pointer in self.seat.pointers_of(owner) {
            self.events.push(Event::PointerLeave { pointer, surface, serial });
            self.events.push(Event::PointerFrame { pointer });
        }
        if toplevel {
            let serial = self.next_serial();
            self.events.push(Event::Configure { surface, serial, width: 0, height: 0, activated: false });
        }
    }

    fn send_focus_enter(&mut self, surface: SurfaceHandle) {
        let Some(state) = self.surfaces.get(surface) else { return };
        let owner = state.owner;
        let toplevel = state.role() == Role::Toplevel && state.has_shell();

        let serial = self.next_serial();
        let modifiers = self.seat.modifiers;
        for keyboard in self.seat.keyboards_of(owner) {
            self.events.push(Event::KeyboardEnter { keyboard, surface, serial });
            self.events.push(Event::KeyboardModifiers { keyboard, serial, modifiers });
        }
        for pointer in self.seat.pointers_of(owner) {
            self.events.push(Event::PointerEnter { pointer, surface, serial, x: 0.0, y: 0.0 });
            self.events.push(Event::PointerFrame { pointer });
        }
        if toplevel {
            let serial = self.next_serial();
            self.events.push(Event::Configure { surface, serial, width: 0, height: 0, activated: true });
        }
    }
}
