//! wl_data_device_manager, wl_data_device and wl_data_source.
//!
//! Sources record what they offer and a device may claim the selection, but
//! no contents are ever transferred between clients.

use wayland_server::protocol::{
    wl_data_device::{self, WlDataDevice},
    wl_data_device_manager::{self, WlDataDeviceManager},
    wl_data_source::{self, WlDataSource},
};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use crate::core::wayland::state::WaylandState;

impl GlobalDispatch<WlDataDeviceManager, ()> for WaylandState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlDataDeviceManager>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl Dispatch<WlDataDeviceManager, ()> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        _resource: &WlDataDeviceManager,
        request: wl_data_device_manager::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_data_device_manager::Request::CreateDataSource { id } => {
                let source = data_init.init(id, ());
                state.data_sources.insert(source.id(), Vec::new());
                tracing::debug!("Created data source {}", source.id());
            }
            wl_data_device_manager::Request::GetDataDevice { id, seat } => {
                let device = data_init.init(id, ());
                tracing::debug!("Created data device {} for seat {}", device.id(), seat.id());
            }
            _ => {}
        }
    }
}

impl Dispatch<WlDataSource, ()> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &WlDataSource,
        request: wl_data_source::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_data_source::Request::Offer { mime_type } => {
                tracing::debug!("Data source {} offers {}", resource.id(), mime_type);
                if let Some(mime_types) = state.data_sources.get_mut(&resource.id()) {
                    mime_types.push(mime_type);
                }
            }
            wl_data_source::Request::SetActions { .. } => {}
            wl_data_source::Request::Destroy => {}
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        resource: &WlDataSource,
        _data: &(),
    ) {
        let id = resource.id();
        state.data_sources.remove(&id);
        if state.selection.as_ref() == Some(&id) {
            state.selection = None;
        }
    }
}

impl Dispatch<WlDataDevice, ()> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &WlDataDevice,
        request: wl_data_device::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_data_device::Request::SetSelection { source, serial } => {
                let id = source.as_ref().map(|s| s.id());
                let mime_types = id.as_ref().and_then(|id| state.data_sources.get(id));
                tracing::debug!("Selection set (serial {}): {:?} offering {:?}", serial, id, mime_types);
                state.selection = id;
            }
            wl_data_device::Request::StartDrag { source, serial, .. } => {
                // No drag-and-drop: the source learns right away that it was refused.
                tracing::debug!("Refusing drag from {} (serial {})", resource.id(), serial);
                if let Some(source) = source {
                    source.cancelled();
                }
            }
            wl_data_device::Request::Release => {}
            _ => {}
        }
    }
}

impl WaylandState {
    /// Mime types offered by the current selection source.
    pub fn selection_mime_types(&self) -> Option<&[String]> {
        let id = self.selection.as_ref()?;
        self.data_sources.get(id).map(Vec::as_slice)
    }
}
