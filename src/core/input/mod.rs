//! Seat state: bound keyboard and pointer observers, the modifier snapshot
//! and the cursor surface.

pub mod keymap;

pub use keymap::{Keymap, KeymapError};

use crate::core::errors::{ProtocolError, Result};
use crate::core::event::ClientKey;
use crate::core::handle::{Handle, HandleTable};
use crate::core::surface::SurfaceHandle;

/// Key state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Released = 0,
    Pressed = 1,
}

pub type ButtonState = KeyState;

/// XKB modifier masks as last broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub depressed: u32,
    pub latched: u32,
    pub locked: u32,
    pub group: u32,
}

/// A bound wl_keyboard-like observer.
#[derive(Debug, Clone, Copy)]
pub struct Keyboard {
    pub owner: ClientKey,
}

/// A bound wl_pointer-like observer.
#[derive(Debug, Clone, Copy)]
pub struct Pointer {
    pub owner: ClientKey,
}

pub type KeyboardHandle = Handle<Keyboard>;
pub type PointerHandle = Handle<Pointer>;

/// Surface drawn at the pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorImage {
    pub surface: SurfaceHandle,
    pub hotspot: (i32, i32),
}

#[derive(Debug)]
pub struct Seat {
    keyboards: HandleTable<Keyboard>,
    pointers: HandleTable<Pointer>,
    pub(crate) modifiers: Modifiers,
    /// Last motion position, surface-local.
    pub(crate) pointer_position: (f64, f64),
    pub(crate) cursor: Option<CursorImage>,
}

impl Seat {
    pub fn new(max_observers: usize) -> Self {
        Self {
            keyboards: HandleTable::with_capacity(max_observers),
            pointers: HandleTable::with_capacity(max_observers),
            modifiers: Modifiers::default(),
            pointer_position: (0.0, 0.0),
            cursor: None,
        }
    }

    pub(crate) fn add_keyboard(&mut self, owner: ClientKey) -> Result<KeyboardHandle> {
        self.keyboards
            .insert(Keyboard { owner })
            .map_err(|e| ProtocolError::ObserverLimit { kind: "keyboard", capacity: e.capacity }.into())
    }

    pub(crate) fn add_pointer(&mut self, owner: ClientKey) -> Result<PointerHandle> {
        self.pointers
            .insert(Pointer { owner })
            .map_err(|e| ProtocolError::ObserverLimit { kind: "pointer", capacity: e.capacity }.into())
    }

    pub(crate) fn remove_keyboard(&mut self, keyboard: KeyboardHandle) -> bool {
        self.keyboards.remove(keyboard).is_some()
    }

    pub(crate) fn remove_pointer(&mut self, pointer: PointerHandle) -> bool {
        self.pointers.remove(pointer).is_some()
    }

    pub fn keyboard_count(&self) -> usize {
        self.keyboards.len()
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Keyboards bound by `owner`.
    pub fn keyboards_of(&self, owner: ClientKey) -> Vec<KeyboardHandle> {
        self.keyboards
            .iter()
            .filter(|(_, k)| k.owner == owner)
            .map(|(h, _)| h)
            .collect()
    }

    /// Pointers bound by `owner`.
    pub fn pointers_of(&self, owner: ClientKey) -> Vec<PointerHandle> {
        self.pointers
            .iter()
            .filter(|(_, p)| p.owner == owner)
            .map(|(h, _)| h)
            .collect()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn cursor(&self) -> Option<CursorImage> {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observers_are_scoped_by_owner() {
        let mut seat = Seat::new(4);
        let a = seat.add_keyboard(ClientKey(1)).unwrap();
        let b = seat.add_keyboard(ClientKey(2)).unwrap();
        let p = seat.add_pointer(ClientKey(1)).unwrap();

        assert_eq!(seat.keyboards_of(ClientKey(1)), vec![a]);
        assert_eq!(seat.keyboards_of(ClientKey(2)), vec![b]);
        assert_eq!(seat.pointers_of(ClientKey(1)), vec![p]);
        assert!(seat.pointers_of(ClientKey(2)).is_empty());

        assert!(seat.remove_keyboard(a));
        assert!(!seat.remove_keyboard(a));
        assert!(seat.keyboards_of(ClientKey(1)).is_empty());
        assert_eq!(seat.keyboard_count(), 1);
    }

    #[test]
    fn observer_capacity_is_bounded() {
        let mut seat = Seat::new(1);
        seat.add_pointer(ClientKey(1)).unwrap();
        let err = seat.add_pointer(ClientKey(1)).unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(err.protocol(), Some(&ProtocolError::ObserverLimit { kind: "pointer", capacity: 1 }));
    }
}
