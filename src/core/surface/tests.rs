use std::sync::Arc;

use crate::core::errors::ProtocolError;
use crate::core::event::{BufferId, CallbackId, ClientKey};
use crate::core::handle::HandleTable;
use crate::core::shm::{MemoryPool, ShmBuffer};
use crate::core::surface::*;

fn parent_handle() -> SurfaceHandle {
    let mut table = HandleTable::with_capacity(1);
    table.insert(Surface::new(ClientKey(1))).unwrap()
}

fn buffer(format: u32) -> ShmBuffer {
    ShmBuffer {
        id: BufferId(1),
        offset: 0,
        width: 1,
        height: 1,
        stride: 4,
        format,
        source: Arc::new(MemoryPool::new(vec![0; 4])),
    }
}

#[test]
fn test_surface_init() {
    let surface = Surface::new(ClientKey(3));
    assert_eq!(surface.owner, ClientKey(3));
    assert!(surface.role().is_none());
    assert!(surface.texture().is_none());
    assert!(!surface.has_pending());
}

#[test]
fn test_role_transitions_from_none() {
    let parent = parent_handle();
    for requested in [
        Role::Toplevel,
        Role::Subsurface { parent },
        Role::BridgedExternal,
        Role::Cursor,
    ] {
        assert_eq!(Role::None.transition(1, requested), Ok(Transition::Assign(requested)));
    }
}

#[test]
fn test_role_is_terminal() {
    let parent = parent_handle();
    let err = Role::Toplevel.transition(4, Role::Subsurface { parent }).unwrap_err();
    assert_eq!(
        err,
        ProtocolError::RoleConflict { surface: 4, current: "toplevel", requested: "subsurface" }
    );

    assert!(Role::Toplevel.transition(4, Role::Toplevel).is_err());
    assert!(Role::Cursor.transition(4, Role::BridgedExternal).is_err());
    assert!(Role::BridgedExternal.transition(4, Role::Cursor).is_err());
}

#[test]
fn test_subsurface_rerequest_is_noop() {
    let parent = parent_handle();
    let role = Role::Subsurface { parent };
    assert_eq!(role.transition(2, Role::Subsurface { parent }), Ok(Transition::Unchanged));
}

#[test]
fn test_plan_configure_only_without_any_buffer() {
    let mut surface = Surface::new(ClientKey(1));
    surface.shell_attached = true;
    assert!(plan_commit(1, &surface).unwrap().configure);

    surface.pending.buffer = Some(Attachment::Buffer(buffer(0)));
    assert!(!plan_commit(1, &surface).unwrap().configure);

    surface.pending.buffer = None;
    surface.current.buffer = Some(BufferId(1));
    assert!(!plan_commit(1, &surface).unwrap().configure);
}

#[test]
fn test_plan_allocates_window_with_role() {
    let mut surface = Surface::new(ClientKey(1));
    surface.pending.role = Some(Role::Toplevel);
    surface.pending.frame = Some(CallbackId(9));
    let plan = plan_commit(1, &surface).unwrap();
    assert_eq!(plan.role, Some(Role::Toplevel));
    assert!(plan.allocate_window);

    surface.pending.role = Some(Role::Cursor);
    assert!(!plan_commit(1, &surface).unwrap().allocate_window);
}

#[test]
fn test_plan_rejects_unknown_format() {
    let mut surface = Surface::new(ClientKey(1));
    surface.pending.buffer = Some(Attachment::Buffer(buffer(0xdead)));
    assert_eq!(plan_commit(1, &surface), Err(ProtocolError::InvalidFormat(0xdead)));
}
