//! Seat observers and raw input delivery.
//!
//! Delivery is gated on a focused surface and scoped to the observers bound
//! by that surface's client.

use super::*;

use crate::core::input::{ButtonState, CursorImage, KeyState, KeyboardHandle, Modifiers, PointerHandle};

impl<S: TextureStore> Compositor<S> {
    // =========================================================================
    // Observers
    // =========================================================================

    pub fn bind_keyboard(&mut self, owner: ClientKey) -> Result<KeyboardHandle> {
        let keyboard = self.seat.add_keyboard(owner)?;
        crate::wlog!(crate::util::logging::SEAT, "Added keyboard to seat (total: {})", self.seat.keyboard_count());

        // A late binder still learns about the focus its client already holds.
        if let Some(surface) = self.focused_surface_of(owner) {
            let serial = self.next_serial();
            self.events.push(Event::KeyboardEnter { keyboard, surface, serial });
            let serial = self.next_serial();
            self.events.push(Event::KeyboardModifiers { keyboard, serial, modifiers: self.seat.modifiers });
        }
        Ok(keyboard)
    }

    pub fn unbind_keyboard(&mut self, keyboard: KeyboardHandle) {
        if self.seat.remove_keyboard(keyboard) {
            crate::wlog!(crate::util::logging::SEAT, "Removed keyboard {}", keyboard.id());
        }
    }

    pub fn bind_pointer(&mut self, owner: ClientKey) -> Result<PointerHandle> {
        let pointer = self.seat.add_pointer(owner)?;
        tracing::debug!("Added pointer to seat (total: {})", self.seat.pointer_count());

        if let Some(surface) = self.focused_surface_of(owner) {
            let serial = self.next_serial();
            let (x, y) = self.seat.pointer_position;
            self.events.push(Event::PointerEnter { pointer, surface, serial, x, y });
            self.events.push(Event::PointerFrame { pointer });
        }
        Ok(pointer)
    }

    pub fn unbind_pointer(&mut self, pointer: PointerHandle) {
        if self.seat.remove_pointer(pointer) {
            tracing::debug!("Removed pointer {}", pointer.id());
        }
    }

    /// wl_pointer.set_cursor: `None` hides the cursor.
    pub fn set_cursor(&mut self, surface: Option<SurfaceHandle>, hotspot: (i32, i32)) -> Result<()> {
        match surface {
            Some(surface) => {
                self.request_role(surface, Role::Cursor)?;
                self.seat.cursor = Some(CursorImage { surface, hotspot });
                crate::wlog!(crate::util::logging::SEAT, "Cursor surface {} hotspot {:?}", surface.id(), hotspot);
            }
            None => self.seat.cursor = None,
        }
        Ok(())
    }

    /// Surface drawn at the pointer, once its role has been committed.
    pub fn cursor(&self) -> Option<CursorImage> {
        self.seat
            .cursor
            .filter(|c| self.surfaces.get(c.surface).map_or(false, |s| s.role() == Role::Cursor))
    }

    // =========================================================================
    // Raw Input
    // =========================================================================

    pub fn deliver_key(&mut self, key: u32, state: KeyState) {
        let Some(owner) = self.focused_owner() else { return };
        let time_ms = self.clock.now_ms();
        for keyboard in self.seat.keyboards_of(owner) {
            let serial = self.next_serial();
            self.events.push(Event::KeyboardKey { keyboard, serial, time_ms, key, state });
        }
    }

    pub fn deliver_button(&mut self, button: u32, state: ButtonState) {
        let Some(owner) = self.focused_owner() else { return };
        let time_ms = self.clock.now_ms();
        for pointer in self.seat.pointers_of(owner) {
            let serial = self.next_serial();
            self.events.push(Event::PointerButton { pointer, serial, time_ms, button, state });
            self.events.push(Event::PointerFrame { pointer });
        }
    }

    /// Pointer motion in focused-surface coordinates.
    pub fn deliver_motion(&mut self, x: f64, y: f64) {
        self.seat.pointer_position = (x, y);
        let Some(owner) = self.focused_owner() else { return };
        let time_ms = self.clock.now_ms();
        for pointer in self.seat.pointers_of(owner) {
            self.events.push(Event::PointerMotion { pointer, time_ms, x, y });
            self.events.push(Event::PointerFrame { pointer });
        }
    }

    /// Update the modifier snapshot; broadcast only when it changed.
    pub fn deliver_modifiers(&mut self, depressed: u32, latched: u32, locked: u32, group: u32) {
        let modifiers = Modifiers { depressed, latched, locked, group };
        if modifiers == self.seat.modifiers {
            return;
        }
        self.seat.modifiers = modifiers;
        let Some(owner) = self.focused_owner() else { return };
        for keyboard in self.seat.keyboards_of(owner) {
            let serial = self.next_serial();
            self.events.push(Event::KeyboardModifiers { keyboard, serial, modifiers });
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn focused_owner(&self) -> Option<ClientKey> {
        let focused = self.focus.focused()?;
        self.surfaces.get(focused).map(|s| s.owner)
    }

    fn focused_surface_of(&self, owner: ClientKey) -> Option<SurfaceHandle> {
        let focused = self.focus.focused()?;
        (self.surfaces.get(focused)?.owner == owner).then_some(focused)
    }
}
