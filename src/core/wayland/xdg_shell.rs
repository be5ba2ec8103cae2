//! xdg_wm_base, xdg_surface, xdg_toplevel, xdg_popup and xdg_positioner.
//!
//! Only toplevels become windows. Popups are created and dismissed at once,
//! and positioners are accepted without being evaluated.

use wayland_protocols::xdg::shell::server::{
    xdg_popup::{self, XdgPopup},
    xdg_positioner::{self, XdgPositioner},
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use crate::core::surface::{Role, SurfaceHandle};
use crate::core::wayland::state::{surface_handle, WaylandState};

/// User data of an xdg_surface. Role errors belong to the wm_base that
/// created it.
#[derive(Debug)]
pub struct XdgSurfaceData {
    pub surface: Option<SurfaceHandle>,
    pub wm_base: XdgWmBase,
}

// ============================================================================
// xdg_wm_base
// ============================================================================

impl GlobalDispatch<XdgWmBase, ()> for WaylandState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<XdgWmBase>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let wm_base = data_init.init(resource, ());
        crate::wlog!(crate::util::logging::SHELL, "Bound xdg_wm_base version {}", wm_base.version());
    }
}

impl Dispatch<XdgWmBase, ()> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &XdgWmBase,
        request: xdg_wm_base::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            xdg_wm_base::Request::GetXdgSurface { id, surface } => {
                let handle = surface_handle(&surface);
                let xdg_surface = data_init.init(
                    id,
                    XdgSurfaceData {
                        surface: handle,
                        wm_base: resource.clone(),
                    },
                );
                let Some(handle) = handle else { return };
                let result = state.compositor.attach_shell(handle);
                if state.check(resource, result).is_none() {
                    return;
                }
                if let Some(objects) = state.objects_mut(handle) {
                    objects.xdg_surface = Some(xdg_surface);
                }
                crate::wlog!(crate::util::logging::SHELL, "Created xdg_surface for surface {}", handle.id());
            }
            xdg_wm_base::Request::CreatePositioner { id } => {
                data_init.init(id, ());
            }
            xdg_wm_base::Request::Pong { serial } => {
                tracing::trace!("xdg_wm_base.pong serial={}", serial);
            }
            xdg_wm_base::Request::Destroy => {}
            _ => {}
        }
    }
}

// ============================================================================
// xdg_surface
// ============================================================================

impl Dispatch<XdgSurface, XdgSurfaceData> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &XdgSurface,
        request: xdg_surface::Request,
        data: &XdgSurfaceData,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            xdg_surface::Request::GetToplevel { id } => {
                let Some(handle) = data.surface else {
                    data_init.init(id, None::<SurfaceHandle>);
                    return;
                };
                let result = state.compositor.request_role(handle, Role::Toplevel);
                let accepted = state.check(&data.wm_base, result).is_some();
                let toplevel = data_init.init(id, accepted.then_some(handle));
                if accepted {
                    if let Some(objects) = state.objects_mut(handle) {
                        objects.toplevel = Some(toplevel);
                    }
                    crate::wlog!(crate::util::logging::SHELL, "Surface {} requested toplevel", handle.id());
                }
            }
            xdg_surface::Request::GetPopup { id, parent, positioner: _ } => {
                let popup = data_init.init(id, ());
                popup.popup_done();
                tracing::debug!(
                    "Dismissed popup on xdg_surface {} (parent {:?})",
                    resource.id(),
                    parent.map(|p| p.id())
                );
            }
            xdg_surface::Request::AckConfigure { serial } => {
                crate::wlog!(crate::util::logging::SHELL, "xdg_surface {} acked configure {}", resource.id(), serial);
            }
            xdg_surface::Request::SetWindowGeometry { x, y, width, height } => {
                tracing::trace!("xdg_surface.set_window_geometry ({}, {}) {}x{}", x, y, width, height);
            }
            xdg_surface::Request::Destroy => {}
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &XdgSurface,
        data: &XdgSurfaceData,
    ) {
        if let Some(objects) = data.surface.and_then(|h| state.objects_mut(h)) {
            objects.xdg_surface = None;
        }
    }
}

// ============================================================================
// xdg_toplevel
// ============================================================================

impl Dispatch<XdgToplevel, Option<SurfaceHandle>> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &XdgToplevel,
        request: xdg_toplevel::Request,
        data: &Option<SurfaceHandle>,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let Some(handle) = *data else { return };
        match request {
            xdg_toplevel::Request::SetTitle { title } => {
                tracing::debug!("Surface {} title: {:?}", handle.id(), title);
                if let Some(objects) = state.objects_mut(handle) {
                    objects.title = title;
                }
            }
            xdg_toplevel::Request::SetAppId { app_id } => {
                tracing::debug!("Surface {} app_id: {:?}", handle.id(), app_id);
                if let Some(objects) = state.objects_mut(handle) {
                    objects.app_id = app_id;
                }
            }
            xdg_toplevel::Request::Destroy => {}
            // Placement belongs to the world; size, state and interactive
            // move/resize requests have nothing to act on.
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &XdgToplevel,
        data: &Option<SurfaceHandle>,
    ) {
        let Some(handle) = *data else { return };
        if let Some(objects) = state.objects_mut(handle) {
            objects.toplevel = None;
        }
        match state.compositor.unmap_window(handle) {
            Ok(()) => crate::wlog!(crate::util::logging::WINDOW, "Toplevel of surface {} unmapped", handle.id()),
            // The wl_surface went first; its teardown already retired the window.
            Err(err) => tracing::debug!("Unmapping surface {}: {}", handle.id(), err),
        }
    }
}

// ============================================================================
// xdg_popup / xdg_positioner
// ============================================================================

impl Dispatch<XdgPopup, ()> for WaylandState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &XdgPopup,
        request: xdg_popup::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        if let xdg_popup::Request::Grab { serial, .. } = request {
            tracing::debug!("Ignoring grab on dismissed popup {} (serial {})", resource.id(), serial);
        }
    }
}

impl Dispatch<XdgPositioner, ()> for WaylandState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &XdgPositioner,
        _request: xdg_positioner::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}
