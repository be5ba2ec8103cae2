//! Invariants that must hold for any request sequence.

use std::sync::Arc;

use proptest::prelude::*;

use worldcomp::core::event::{BufferId, CallbackId, ClientKey, Event};
use worldcomp::core::handle::{Handle, HandleTable};
use worldcomp::core::shm::{MemoryPool, ShmBuffer};
use worldcomp::core::surface::{Role, SurfaceHandle};
use worldcomp::core::{Compositor, CompositorConfig};

const CLIENT: ClientKey = ClientKey(1);

#[derive(Debug, Clone)]
enum Op {
    Attach { width: i32, height: i32 },
    Detach,
    Frame,
    Toplevel,
    Subsurface,
    Cursor,
    Commit,
    Tick,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => (1..8i32, 1..8i32).prop_map(|(width, height)| Op::Attach { width, height }),
        1 => Just(Op::Detach),
        1 => Just(Op::Frame),
        1 => Just(Op::Toplevel),
        1 => Just(Op::Subsurface),
        1 => Just(Op::Cursor),
        3 => Just(Op::Commit),
        1 => Just(Op::Tick),
    ]
}

fn buffer(id: u64, width: i32, height: i32) -> ShmBuffer {
    ShmBuffer {
        id: BufferId(id),
        offset: 0,
        width,
        height,
        stride: width * 4,
        format: 0,
        source: Arc::new(MemoryPool::new(vec![0x7f; (width * height * 4) as usize])),
    }
}

/// Everything observable about a surface's committed state.
fn snapshot(c: &Compositor, s: SurfaceHandle) -> String {
    format!("{:?}", c.surface(s).unwrap().current())
}

proptest! {
    #[test]
    fn current_state_changes_only_on_commit(ops in prop::collection::vec(op(), 1..40)) {
        let mut c = Compositor::with_software_textures(&CompositorConfig::default());
        let parent = c.create_surface(CLIENT).unwrap();
        let s = c.create_surface(CLIENT).unwrap();
        let mut next_id = 1u64;
        let mut committed_role = Role::None;

        for op in ops {
            let before = snapshot(&c, s);
            next_id += 1;
            match op {
                Op::Attach { width, height } => {
                    c.attach(s, Some(buffer(next_id, width, height)), 0, 0).unwrap();
                }
                Op::Detach => c.attach(s, None, 0, 0).unwrap(),
                Op::Frame => c.request_frame(s, CallbackId(next_id)).unwrap(),
                Op::Toplevel | Op::Subsurface | Op::Cursor => {
                    let role = match op {
                        Op::Toplevel => Role::Toplevel,
                        Op::Subsurface => Role::Subsurface { parent },
                        _ => Role::Cursor,
                    };
                    let effective = c.surface(s).unwrap().effective_role();
                    let result = c.request_role(s, role);
                    let same_kind = std::mem::discriminant(&effective) == std::mem::discriminant(&role);
                    if effective.is_none() || (same_kind && role != Role::Toplevel) {
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert!(result.is_err());
                    }
                }
                Op::Commit => {
                    c.commit(s).unwrap();
                    prop_assert!(!c.surface(s).unwrap().has_pending());
                    // A second commit with nothing staged changes nothing.
                    let after = snapshot(&c, s);
                    c.take_events();
                    c.commit(s).unwrap();
                    prop_assert_eq!(snapshot(&c, s), after);
                    prop_assert!(c.take_events().is_empty());

                    let role = c.surface(s).unwrap().role();
                    if !committed_role.is_none() {
                        prop_assert_eq!(role, committed_role);
                    }
                    committed_role = role;
                    continue;
                }
                Op::Tick => {
                    c.advance_tick();
                    continue;
                }
            }
            prop_assert_eq!(snapshot(&c, s), before);
        }
    }

    #[test]
    fn window_ids_round_trip(count in 1usize..10, destroy in prop::collection::vec(any::<bool>(), 10)) {
        let mut c = Compositor::with_software_textures(&CompositorConfig::default());
        let mut surfaces = Vec::new();
        for _ in 0..count {
            let s = c.create_surface(CLIENT).unwrap();
            c.request_role(s, Role::Toplevel).unwrap();
            c.commit(s).unwrap();
            surfaces.push(s);
        }
        for (s, gone) in surfaces.iter().zip(&destroy) {
            if *gone {
                c.destroy_surface(*s).unwrap();
            }
        }
        for (s, gone) in surfaces.iter().zip(&destroy) {
            if *gone {
                continue;
            }
            let window = c.window_for(*s).unwrap();
            let id = c.windows().window_id(window).unwrap();
            prop_assert_eq!(c.windows().window_id(c.window_for(*s).unwrap()), Some(id));
            prop_assert_eq!(c.windows().window_from_id(id), Some(window));
            prop_assert_eq!(c.surface_for(window), Some(*s));
        }
    }

    #[test]
    fn focus_changes_leave_before_enter(targets in prop::collection::vec(0u32..5, 1..20)) {
        let mut c = Compositor::with_software_textures(&CompositorConfig::default());
        for _ in 0..3 {
            let s = c.create_surface(CLIENT).unwrap();
            c.request_role(s, Role::Toplevel).unwrap();
            c.commit(s).unwrap();
        }
        c.bind_keyboard(CLIENT).unwrap();
        c.take_events();

        for target in targets {
            c.world_mut().set_focused_id(target);
            c.advance_tick();
            let events = c.take_events();

            let leaves: Vec<_> = events.iter().enumerate()
                .filter(|(_, e)| matches!(e, Event::KeyboardLeave { .. })).collect();
            let enters: Vec<_> = events.iter().enumerate()
                .filter(|(_, e)| matches!(e, Event::KeyboardEnter { .. })).collect();
            prop_assert!(leaves.len() <= 1);
            prop_assert!(enters.len() <= 1);
            if let (Some((li, leave)), Some((ei, enter))) = (leaves.first(), enters.first()) {
                prop_assert!(li < ei);
                prop_assert_ne!(leave.surface(), enter.surface());
            }
            if let Some((_, enter)) = enters.first() {
                prop_assert_eq!(enter.surface(), c.focused_surface());
            }
        }
    }

    #[test]
    fn stale_handles_never_resolve(ops in prop::collection::vec(any::<bool>(), 1..60)) {
        let mut table: HandleTable<u32> = HandleTable::with_capacity(4);
        let mut live: Vec<Handle<u32>> = Vec::new();
        let mut dead: Vec<Handle<u32>> = Vec::new();

        for (i, insert) in ops.into_iter().enumerate() {
            if insert {
                match table.insert(i as u32) {
                    Ok(handle) => live.push(handle),
                    Err(err) => prop_assert_eq!(err.capacity, 4),
                }
            } else if let Some(handle) = live.pop() {
                prop_assert!(table.remove(handle).is_some());
                dead.push(handle);
            }

            prop_assert_eq!(table.len(), live.len());
            for handle in &live {
                prop_assert!(table.contains(*handle));
            }
            for handle in &dead {
                prop_assert!(table.get(*handle).is_none());
            }
        }
    }
}
