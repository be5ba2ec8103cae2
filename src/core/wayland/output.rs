//! wl_output: one fixed output describing the world viewport.

use wayland_server::protocol::wl_output::{self, Subpixel, Transform, WlOutput};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use crate::core::config::OutputConfig;
use crate::core::wayland::state::WaylandState;

impl GlobalDispatch<WlOutput, ()> for WaylandState {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlOutput>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let output = data_init.init(resource, ());
        send_output_info(&output, &state.config.output);
    }
}

impl Dispatch<WlOutput, ()> for WaylandState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &WlOutput,
        request: wl_output::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_output::Request::Release = request {
            crate::wlog!(crate::util::logging::COMPOSITOR, "wl_output {} released", resource.id());
        }
    }
}

/// Describe the output to a freshly bound resource.
fn send_output_info(output: &WlOutput, config: &OutputConfig) {
    output.geometry(
        0,
        0,
        config.physical_width,
        config.physical_height,
        Subpixel::Unknown,
        config.make.clone(),
        config.model.clone(),
        Transform::Normal,
    );
    output.mode(
        wl_output::Mode::Current | wl_output::Mode::Preferred,
        config.width,
        config.height,
        config.refresh,
    );
    if output.version() >= 2 {
        output.scale(config.scale);
    }
    if output.version() >= 4 {
        output.name(config.name.clone());
        output.description(format!("{} {} ({}x{})", config.make, config.model, config.width, config.height));
    }
    if output.version() >= 2 {
        output.done();
    }

    crate::wlog!(
        crate::util::logging::COMPOSITOR,
        "Sent output info: {} {}x{} @ {}mHz, scale {}, version {}",
        config.name,
        config.width,
        config.height,
        config.refresh,
        config.scale,
        output.version()
    );
}
