//! wl_seat, wl_keyboard and wl_pointer.
//!
//! The seat advertises keyboard and pointer only. Observers are registered
//! with the core, which decides what each one receives.

use wayland_server::protocol::{
    wl_keyboard::{self, WlKeyboard},
    wl_pointer::{self, WlPointer},
    wl_seat::{self, WlSeat},
    wl_touch::{self, WlTouch},
};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use crate::core::errors::ProtocolError;
use crate::core::input::{KeyboardHandle, PointerHandle};
use crate::core::wayland::state::{client_key, surface_handle, WaylandState};

const SEAT_NAME: &str = "seat0";

// ============================================================================
// wl_seat
// ============================================================================

impl GlobalDispatch<WlSeat, ()> for WaylandState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlSeat>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let seat = data_init.init(resource, ());
        seat.capabilities(wl_seat::Capability::Keyboard | wl_seat::Capability::Pointer);
        if seat.version() >= 2 {
            seat.name(SEAT_NAME.to_string());
        }
        crate::wlog!(crate::util::logging::SEAT, "Bound wl_seat version {}", seat.version());
    }
}

impl Dispatch<WlSeat, ()> for WaylandState {
    fn request(
        state: &mut Self,
        client: &Client,
        resource: &WlSeat,
        request: wl_seat::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_seat::Request::GetKeyboard { id } => match state.compositor.bind_keyboard(client_key(client)) {
                Ok(handle) => {
                    let keyboard = data_init.init(id, Some(handle));
                    state.send_keymap(&keyboard);
                    state.keyboards.insert(handle, keyboard);
                }
                Err(err) => {
                    data_init.init(id, None::<KeyboardHandle>);
                    state.report(resource, err);
                }
            },
            wl_seat::Request::GetPointer { id } => match state.compositor.bind_pointer(client_key(client)) {
                Ok(handle) => {
                    let pointer = data_init.init(id, Some(handle));
                    state.pointers.insert(handle, pointer);
                }
                Err(err) => {
                    data_init.init(id, None::<PointerHandle>);
                    state.report(resource, err);
                }
            },
            wl_seat::Request::GetTouch { id } => {
                data_init.init(id, ());
                state.report(resource, ProtocolError::MissingCapability("touch").into());
            }
            wl_seat::Request::Release => {
                crate::wlog!(crate::util::logging::SEAT, "wl_seat {} released", resource.id());
            }
            _ => {}
        }
    }
}

// ============================================================================
// wl_keyboard
// ============================================================================

impl Dispatch<WlKeyboard, Option<KeyboardHandle>> for WaylandState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlKeyboard,
        _request: wl_keyboard::Request,
        _data: &Option<KeyboardHandle>,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &WlKeyboard,
        data: &Option<KeyboardHandle>,
    ) {
        if let Some(handle) = *data {
            state.keyboards.remove(&handle);
            state.compositor.unbind_keyboard(handle);
        }
    }
}

// ============================================================================
// wl_pointer
// ============================================================================

impl Dispatch<WlPointer, Option<PointerHandle>> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &WlPointer,
        request: wl_pointer::Request,
        _data: &Option<PointerHandle>,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_pointer::Request::SetCursor { serial, surface, hotspot_x, hotspot_y } = request {
            let handle = match surface.as_ref().map(surface_handle) {
                Some(None) => return,
                Some(Some(handle)) => Some(handle),
                None => None,
            };
            tracing::debug!("wl_pointer.set_cursor serial={} surface={:?}", serial, handle);
            let result = state.compositor.set_cursor(handle, (hotspot_x, hotspot_y));
            state.check(resource, result);
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &WlPointer,
        data: &Option<PointerHandle>,
    ) {
        if let Some(handle) = *data {
            state.pointers.remove(&handle);
            state.compositor.unbind_pointer(handle);
        }
    }
}

// ============================================================================
// wl_touch
// ============================================================================

impl Dispatch<WlTouch, ()> for WaylandState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlTouch,
        _request: wl_touch::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}
