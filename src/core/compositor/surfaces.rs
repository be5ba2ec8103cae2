//! Surface lifecycle, staging requests and commit.

use super::*;

use crate::core::event::CallbackId;
use crate::core::frame::replace_pending;
use crate::core::import::import;
use crate::core::shm::ShmBuffer;
use crate::core::surface::{plan_commit, Attachment, Transition};

impl<S: TextureStore> Compositor<S> {
    // =========================================================================
    // Surface Management
    // =========================================================================

    pub fn create_surface(&mut self, owner: ClientKey) -> Result<SurfaceHandle> {
        let handle = self
            .surfaces
            .insert(Surface::new(owner))
            .map_err(|e| CoreError::CapacityExhausted { table: "surface", capacity: e.capacity })?;
        crate::wlog!(crate::util::logging::SURFACE, "Created surface {} for client {:?}", handle.id(), owner);
        Ok(handle)
    }

    /// Tear down a surface whose protocol object is gone.
    ///
    /// Releases its texture, retires callbacks, marks its window destroyed
    /// and drops focus and cursor references without notifying anyone.
    pub fn destroy_surface(&mut self, handle: SurfaceHandle) -> Result<()> {
        let surface = self
            .surfaces
            .remove(handle)
            .ok_or(CoreError::InvalidSurface(handle.id()))?;

        if let Some(texture) = surface.current.texture {
            self.textures.release(texture);
        }
        for callback in [surface.pending.frame, surface.current.frame].into_iter().flatten() {
            self.events.push(Event::FrameDiscarded { callback });
        }
        if let Some(window) = surface.window {
            self.windows.mark_destroyed(window);
        }
        self.focus.forget(handle);
        if self.seat.cursor.map_or(false, |c| c.surface == handle) {
            self.seat.cursor = None;
        }

        crate::wlog!(crate::util::logging::SURFACE, "Destroyed surface {} (role {})", handle.id(), surface.current.role.name());
        Ok(())
    }

    // =========================================================================
    // Pending State
    // =========================================================================

    /// Stage a buffer (or `None` to unmap). Offsets other than zero are
    /// rejected; nothing is read until commit.
    pub fn attach(&mut self, handle: SurfaceHandle, buffer: Option<ShmBuffer>, x: i32, y: i32) -> Result<()> {
        if x != 0 || y != 0 {
            return Err(ProtocolError::InvalidOffset { x, y }.into());
        }
        let surface = self.live_surface_mut(handle)?;
        surface.pending.buffer = Some(match buffer {
            Some(buffer) => Attachment::Buffer(buffer),
            None => Attachment::Detach,
        });
        Ok(())
    }

    /// Stage a one-shot frame callback. A second request before commit
    /// supersedes the first.
    pub fn request_frame(&mut self, handle: SurfaceHandle, callback: CallbackId) -> Result<()> {
        let surface = self
            .surfaces
            .get_mut(handle)
            .ok_or(CoreError::InvalidSurface(handle.id()))?;
        replace_pending(&mut surface.pending.frame, callback, &mut self.events);
        Ok(())
    }

    /// Validate and stage a role. Conflicts are reported immediately; the
    /// role itself only takes effect on the next commit.
    pub fn request_role(&mut self, handle: SurfaceHandle, role: Role) -> Result<()> {
        let surface = self.live_surface(handle)?;
        let transition = surface.effective_role().transition(handle.id(), role)?;
        if let Transition::Assign(role) = transition {
            if let Role::Subsurface { parent } = role {
                self.validate_parent(handle, parent)?;
            }
            self.live_surface_mut(handle)?.pending.role = Some(role);
            crate::wlog!(crate::util::logging::SURFACE, "Surface {} staged role {}", handle.id(), role.name());
        }
        Ok(())
    }

    /// Record that a window-shell object now wraps the surface.
    pub fn attach_shell(&mut self, handle: SurfaceHandle) -> Result<()> {
        self.live_surface_mut(handle)?.shell_attached = true;
        Ok(())
    }

    /// Admit a surface from the legacy-protocol bridge.
    pub fn admit_bridged(&mut self, handle: SurfaceHandle) -> Result<()> {
        self.request_role(handle, Role::BridgedExternal)
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Move pending state to current.
    ///
    /// Everything that can fail is checked before anything is applied, so an
    /// error leaves the surface exactly as it was.
    pub fn commit(&mut self, handle: SurfaceHandle) -> Result<()> {
        self.drop_orphaned_subsurface(handle)?;
        let surface = self.live_surface(handle)?;
        let plan = plan_commit(handle.id(), surface)?;
        if let Some(Role::Subsurface { parent }) = plan.role {
            self.validate_parent(handle, parent)?;
        }

        // Allocation is the only step that can fail after validation, so it
        // runs first and role plus window land together.
        let window = if plan.allocate_window {
            Some(self.windows.allocate(handle, None)?)
        } else {
            None
        };

        let serial = if plan.configure { Some(self.next_serial()) } else { None };
        let activated = self.focus.has_focus(handle);

        let Some(surface) = self.surfaces.get_mut(handle) else {
            return Err(CoreError::InvalidSurface(handle.id()));
        };
        let pending = std::mem::take(&mut surface.pending);

        if let Some(serial) = serial {
            self.events.push(Event::Configure { surface: handle, serial, width: 0, height: 0, activated });
        }

        match pending.buffer {
            Some(Attachment::Buffer(buffer)) => {
                let previous = surface.current.texture.take();
                match import(&mut self.textures, &buffer) {
                    Ok(imported) => {
                        surface.current.texture = Some(imported.texture);
                        surface.current.width = imported.width as i32;
                        surface.current.height = imported.height as i32;
                    }
                    Err(err) => {
                        tracing::warn!("Surface {}: buffer import failed: {}", handle.id(), err);
                        surface.current.width = buffer.width;
                        surface.current.height = buffer.height;
                    }
                }
                if let Some(texture) = previous {
                    self.textures.release(texture);
                }
                // Import copied the pixels; the client may reuse the buffer now.
                self.events.push(Event::BufferRelease { buffer: buffer.id });
                surface.current.buffer = Some(buffer.id);
            }
            Some(Attachment::Detach) => {
                if let Some(texture) = surface.current.texture.take() {
                    self.textures.release(texture);
                }
                surface.current.buffer = None;
                surface.current.width = 0;
                surface.current.height = 0;
            }
            None => {}
        }

        if let Some(role) = plan.role {
            surface.current.role = role;
            if let Some(window) = window {
                surface.window = Some(window);
            }
            if role == Role::Cursor {
                crate::wlog!(crate::util::logging::SEAT, "Surface {} is now a cursor", handle.id());
            }
            tracing::info!("Surface {} committed role {}", handle.id(), role.name());
        }

        if let Some(window) = surface.window {
            self.windows.set_texture(window, surface.current.texture);
        }

        if let Some(callback) = pending.frame {
            replace_pending(&mut surface.current.frame, callback, &mut self.events);
        }

        crate::wlog!(
            crate::util::logging::SURFACE,
            "Committed surface {}: {}x{} texture={:?}",
            handle.id(),
            surface.current.width,
            surface.current.height,
            surface.current.texture
        );
        Ok(())
    }

    /// A subsurface whose parent died before the child's first commit never
    /// takes the role; the wl_subsurface is inert from then on.
    fn drop_orphaned_subsurface(&mut self, handle: SurfaceHandle) -> Result<()> {
        let surface = self.live_surface(handle)?;
        let Some(Role::Subsurface { parent }) = surface.pending.role else {
            return Ok(());
        };
        if !surface.current.role.is_none() || self.surfaces.contains(parent) {
            return Ok(());
        }
        self.live_surface_mut(handle)?.pending.role = None;
        crate::wlog!(
            crate::util::logging::SURFACE,
            "Surface {} dropped subsurface role: parent {} is gone",
            handle.id(),
            parent.id()
        );
        Ok(())
    }
}
