#[cfg(test)]
mod tests {
    use crate::core::errors::CoreError;
    use crate::core::event::ClientKey;
    use crate::core::handle::HandleTable;
    use crate::core::import::TextureId;
    use crate::core::surface::{Surface, SurfaceHandle};
    use crate::core::window::{FocusChange, FocusRouter, WindowTable};

    fn surfaces(n: usize) -> Vec<SurfaceHandle> {
        let mut table = HandleTable::with_capacity(n);
        (0..n).map(|_| table.insert(Surface::new(ClientKey(1))).unwrap()).collect()
    }

    #[test]
    fn test_window_table_allocation() {
        let s = surfaces(2);
        let mut windows = WindowTable::with_capacity(4);

        let w1 = windows.allocate(s[0], None).unwrap();
        let w2 = windows.allocate(s[1], Some(TextureId(7))).unwrap();
        assert_eq!(windows.count(), 2);
        assert_eq!(windows.window_id(w1), Some(1));
        assert_eq!(windows.window_id(w2), Some(2));
        assert_eq!(windows.window_from_id(2), Some(w2));
        assert_eq!(windows.surface_for(w1), Some(s[0]));
        assert_eq!(windows.get(w2).unwrap().texture(), Some(TextureId(7)));
        assert!(windows.window_from_id(0).is_none());
        assert!(windows.window_from_id(3).is_none());
    }

    #[test]
    fn test_destroyed_windows_keep_their_slot() {
        let s = surfaces(2);
        let mut windows = WindowTable::with_capacity(2);
        let w1 = windows.allocate(s[0], Some(TextureId(1))).unwrap();
        windows.mark_destroyed(w1);

        let window = windows.get(w1).unwrap();
        assert!(!window.is_valid());
        assert_eq!(window.texture(), None);
        assert_eq!(windows.surface_for(w1), None);
        assert_eq!(windows.count(), 1);
        assert_eq!(windows.live_count(), 0);

        let w2 = windows.allocate(s[1], None).unwrap();
        assert_eq!(windows.window_id(w2), Some(2));
    }

    #[test]
    fn test_window_capacity() {
        let s = surfaces(2);
        let mut windows = WindowTable::with_capacity(1);
        windows.allocate(s[0], None).unwrap();
        assert!(windows.is_full());
        match windows.allocate(s[1], None) {
            Err(CoreError::CapacityExhausted { table, capacity }) => {
                assert_eq!(table, "window");
                assert_eq!(capacity, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_placement_is_world_owned() {
        let s = surfaces(1);
        let mut windows = WindowTable::with_capacity(1);
        windows.allocate(s[0], None).unwrap();
        windows.placement_mut(1).unwrap().position = [1.0, 2.0, 3.0];
        assert_eq!(windows.get_by_id(1).unwrap().placement.position, [1.0, 2.0, 3.0]);
        assert!(windows.placement_mut(9).is_none());
    }

    #[test]
    fn test_focus_router() {
        let s = surfaces(2);
        let mut focus = FocusRouter::new();
        assert_eq!(focus.focused(), None);

        // Unchanged id: nothing to do.
        assert_eq!(focus.update(0, |_| None), None);

        let change = focus.update(1, |_| Some(s[0])).unwrap();
        assert_eq!(change, FocusChange { previous: None, next: Some(s[0]) });
        assert!(focus.has_focus(s[0]));
        assert_eq!(focus.update(1, |_| panic!("not resolved again")), None);

        let change = focus.update(2, |_| Some(s[1])).unwrap();
        assert_eq!(change, FocusChange { previous: Some(s[0]), next: Some(s[1]) });

        focus.forget(s[1]);
        assert_eq!(focus.focused(), None);
        assert_eq!(focus.broadcast_id(), 2);

        let change = focus.update(0, |_| panic!("zero is never resolved")).unwrap();
        assert_eq!(change, FocusChange { previous: None, next: None });
    }
}
