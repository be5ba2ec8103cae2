//! wl_shm, wl_shm_pool and wl_buffer.

use std::sync::Arc;

use wayland_server::protocol::{
    wl_buffer::{self, WlBuffer},
    wl_shm::{self, WlShm},
    wl_shm_pool::{self, WlShmPool},
};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, WEnum};

use crate::core::errors::CoreError;
use crate::core::event::BufferId;
use crate::core::import::PixelFormat;
use crate::core::shm::{ShmBuffer, ShmPool};
use crate::core::wayland::state::WaylandState;

impl GlobalDispatch<WlShm, ()> for WaylandState {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlShm>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let shm = data_init.init(resource, ());
        for format in PixelFormat::ALL {
            shm.format(match format {
                PixelFormat::Argb8888 => wl_shm::Format::Argb8888,
                PixelFormat::Xrgb8888 => wl_shm::Format::Xrgb8888,
            });
        }
        crate::wlog!(crate::util::logging::BUFFER, "Bound wl_shm, advertised {} formats", PixelFormat::ALL.len());
    }
}

impl Dispatch<WlShm, ()> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &WlShm,
        request: wl_shm::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_shm::Request::CreatePool { id, fd, size } = request {
            match ShmPool::new(fd, size) {
                Ok(pool) => {
                    data_init.init(id, Some(Arc::new(pool)));
                }
                Err(err) => {
                    data_init.init(id, None::<Arc<ShmPool>>);
                    state.report(resource, CoreError::from(err));
                }
            }
        }
    }
}

impl Dispatch<WlShmPool, Option<Arc<ShmPool>>> for WaylandState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &WlShmPool,
        request: wl_shm_pool::Request,
        data: &Option<Arc<ShmPool>>,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_shm_pool::Request::CreateBuffer { id, offset, width, height, stride, format } => {
                let Some(pool) = data else {
                    data_init.init(id, None::<ShmBuffer>);
                    return;
                };
                let code: u32 = match format {
                    WEnum::Value(format) => format.into(),
                    WEnum::Unknown(raw) => raw,
                };
                let buffer = ShmBuffer {
                    id: BufferId(state.next_object_id()),
                    offset,
                    width,
                    height,
                    stride,
                    format: code,
                    source: pool.clone(),
                };
                let checked = PixelFormat::from_wl(code).and_then(|_| buffer.validate());
                match checked {
                    Ok(()) => {
                        let buffer_id = buffer.id;
                        let wl_buffer = data_init.init(id, Some(buffer));
                        state.buffers.insert(buffer_id, wl_buffer);
                        crate::wlog!(
                            crate::util::logging::BUFFER,
                            "Created buffer {:?}: {}x{} stride={} format={:#x}",
                            buffer_id,
                            width,
                            height,
                            stride,
                            code
                        );
                    }
                    Err(err) => {
                        data_init.init(id, None::<ShmBuffer>);
                        state.report(resource, CoreError::from(err));
                    }
                }
            }
            wl_shm_pool::Request::Resize { size } => {
                if let Some(pool) = data {
                    if let Err(err) = pool.resize(size) {
                        state.report(resource, CoreError::from(err));
                    }
                }
            }
            wl_shm_pool::Request::Destroy => {}
            _ => {}
        }
    }
}

impl Dispatch<WlBuffer, Option<ShmBuffer>> for WaylandState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &WlBuffer,
        _request: wl_buffer::Request,
        _data: &Option<ShmBuffer>,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &WlBuffer,
        data: &Option<ShmBuffer>,
    ) {
        if let Some(buffer) = data {
            state.buffers.remove(&buffer.id);
        }
    }
}
