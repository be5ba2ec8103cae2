//! wl_compositor, wl_surface, wl_region and wl_callback.
//!
//! wl_surface user data is the core handle, or `None` when the surface
//! table was full and the request has already been reported.

use wayland_server::protocol::{
    wl_buffer::WlBuffer,
    wl_callback::{self, WlCallback},
    wl_compositor::{self, WlCompositor},
    wl_region::{self, WlRegion},
    wl_surface::{self, WlSurface},
};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use crate::core::event::CallbackId;
use crate::core::shm::ShmBuffer;
use crate::core::surface::SurfaceHandle;
use crate::core::wayland::state::{client_key, WaylandState};

// ============================================================================
// wl_compositor
// ============================================================================

impl GlobalDispatch<WlCompositor, ()> for WaylandState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlCompositor>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let compositor = data_init.init(resource, ());
        crate::wlog!(crate::util::logging::COMPOSITOR, "Bound wl_compositor version {}", compositor.version());
    }
}

impl Dispatch<WlCompositor, ()> for WaylandState {
    fn request(
        state: &mut Self,
        client: &Client,
        _resource: &WlCompositor,
        request: wl_compositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_compositor::Request::CreateSurface { id } => {
                match state.compositor.create_surface(client_key(client)) {
                    Ok(handle) => {
                        let surface = data_init.init(id, Some(handle));
                        state.track_surface(handle, surface);
                    }
                    Err(err) => {
                        let surface = data_init.init(id, None::<SurfaceHandle>);
                        state.report(&surface, err);
                    }
                }
            }
            wl_compositor::Request::CreateRegion { id } => {
                data_init.init(id, ());
            }
            _ => {}
        }
    }
}

// ============================================================================
// wl_surface
// ============================================================================

impl Dispatch<WlSurface, Option<SurfaceHandle>> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &WlSurface,
        request: wl_surface::Request,
        data: &Option<SurfaceHandle>,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let Some(handle) = *data else {
            // Still has to hand out the callback object.
            if let wl_surface::Request::Frame { callback } = request {
                data_init.init(callback, CallbackId(0));
            }
            return;
        };

        match request {
            wl_surface::Request::Attach { buffer, x, y } => {
                let shm = buffer.as_ref().and_then(buffer_of);
                if buffer.is_some() && shm.is_none() {
                    // A buffer whose creation already failed.
                    return;
                }
                let result = state.compositor.attach(handle, shm, x, y);
                state.check(resource, result);
            }
            wl_surface::Request::Frame { callback } => {
                let id = CallbackId(state.next_object_id());
                let callback = data_init.init(callback, id);
                state.callbacks.insert(id, callback);
                let result = state.compositor.request_frame(handle, id);
                state.check(resource, result);
            }
            wl_surface::Request::Commit => {
                let result = state.compositor.commit(handle);
                state.check(resource, result);
            }
            wl_surface::Request::Damage { .. } | wl_surface::Request::DamageBuffer { .. } => {}
            wl_surface::Request::SetOpaqueRegion { .. } | wl_surface::Request::SetInputRegion { .. } => {}
            wl_surface::Request::SetBufferScale { scale } => {
                tracing::trace!("Surface {} buffer scale {} ignored", handle.id(), scale);
            }
            wl_surface::Request::SetBufferTransform { .. } => {}
            wl_surface::Request::Offset { x, y } => {
                tracing::trace!("Surface {} offset ({}, {}) ignored", handle.id(), x, y);
            }
            wl_surface::Request::Destroy => {}
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &WlSurface,
        data: &Option<SurfaceHandle>,
    ) {
        let Some(handle) = *data else { return };
        state.surfaces.remove(&handle);
        if let Err(err) = state.compositor.destroy_surface(handle) {
            tracing::warn!("Destroying surface {}: {}", handle.id(), err);
        }
    }
}

fn buffer_of(buffer: &WlBuffer) -> Option<ShmBuffer> {
    buffer.data::<Option<ShmBuffer>>().cloned().flatten()
}

// ============================================================================
// wl_region
// ============================================================================

impl Dispatch<WlRegion, ()> for WaylandState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlRegion,
        request: wl_region::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_region::Request::Add { x, y, width, height } = request {
            tracing::trace!("wl_region.add ({}, {}) {}x{}", x, y, width, height);
        }
    }
}

// ============================================================================
// wl_callback
// ============================================================================

impl Dispatch<WlCallback, CallbackId> for WaylandState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlCallback,
        _request: wl_callback::Request,
        _data: &CallbackId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &WlCallback,
        data: &CallbackId,
    ) {
        state.callbacks.remove(data);
    }
}
