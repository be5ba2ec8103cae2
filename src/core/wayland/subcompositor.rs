//! wl_subcompositor and wl_subsurface.
//!
//! A subsurface only records its parent. Position, stacking and sync mode
//! are accepted but never applied.

use wayland_server::protocol::{
    wl_subcompositor::{self, WlSubcompositor},
    wl_subsurface::{self, WlSubsurface},
};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use crate::core::errors::ProtocolError;
use crate::core::surface::{Role, SurfaceHandle};
use crate::core::wayland::state::{surface_handle, WaylandState};

impl GlobalDispatch<WlSubcompositor, ()> for WaylandState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlSubcompositor>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl Dispatch<WlSubcompositor, ()> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &WlSubcompositor,
        request: wl_subcompositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_subcompositor::Request::GetSubsurface { id, surface, parent } = request {
            let (Some(child), Some(parent_handle)) = (surface_handle(&surface), surface_handle(&parent)) else {
                data_init.init(id, None::<SurfaceHandle>);
                if surface_handle(&parent).is_none() {
                    state.report(resource, ProtocolError::BadParent("parent is not a live surface").into());
                }
                return;
            };

            let result = state.compositor.request_role(child, Role::Subsurface { parent: parent_handle });
            let accepted = state.check(resource, result).is_some();
            data_init.init(id, accepted.then_some(child));
            if accepted {
                crate::wlog!(
                    crate::util::logging::SURFACE,
                    "Created subsurface: surface={} parent={}",
                    child.id(),
                    parent_handle.id()
                );
            }
        }
    }
}

impl Dispatch<WlSubsurface, Option<SurfaceHandle>> for WaylandState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlSubsurface,
        request: wl_subsurface::Request,
        data: &Option<SurfaceHandle>,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let Some(handle) = *data else { return };
        match request {
            wl_subsurface::Request::SetPosition { x, y } => {
                tracing::trace!("Subsurface {} set_position ({}, {}) ignored", handle.id(), x, y);
            }
            wl_subsurface::Request::PlaceAbove { sibling } | wl_subsurface::Request::PlaceBelow { sibling } => {
                tracing::trace!("Subsurface {} restack relative to {} ignored", handle.id(), sibling.id());
            }
            wl_subsurface::Request::SetSync | wl_subsurface::Request::SetDesync => {}
            _ => {}
        }
    }
}
