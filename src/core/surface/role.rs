use crate::core::errors::ProtocolError;
use crate::core::surface::SurfaceHandle;

/// What a surface is used for. Assigned once; the first successful
/// assignment is terminal until the surface is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    None,
    Toplevel,
    Subsurface { parent: SurfaceHandle },
    /// A window admitted from the legacy-protocol bridge.
    BridgedExternal,
    Cursor,
}

/// Outcome of a validated role request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The surface takes the requested role.
    Assign(Role),
    /// Same role again; nothing changes.
    Unchanged,
}

impl Role {
    pub fn is_none(&self) -> bool {
        matches!(self, Role::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::None => "none",
            Role::Toplevel => "toplevel",
            Role::Subsurface { .. } => "subsurface",
            Role::BridgedExternal => "bridged_external",
            Role::Cursor => "cursor",
        }
    }

    /// Roles that get a slot in the world window table.
    pub fn needs_window(&self) -> bool {
        matches!(self, Role::Toplevel | Role::BridgedExternal)
    }

    pub fn parent(&self) -> Option<SurfaceHandle> {
        match self {
            Role::Subsurface { parent } => Some(*parent),
            _ => None,
        }
    }

    /// Validate moving `surface` from `self` to `requested`.
    ///
    /// | current  | requested  | result                      |
    /// |----------|------------|-----------------------------|
    /// | none     | any        | assign                      |
    /// | subsurface | subsurface | unchanged (no reparenting) |
    /// | cursor   | cursor     | unchanged                   |
    /// | other    | any        | role conflict               |
    pub fn transition(&self, surface: u32, requested: Role) -> Result<Transition, ProtocolError> {
        match (self, requested) {
            (_, Role::None) => Ok(Transition::Unchanged),
            (Role::None, role) => Ok(Transition::Assign(role)),
            (Role::Subsurface { .. }, Role::Subsurface { .. }) => Ok(Transition::Unchanged),
            (Role::Cursor, Role::Cursor) => Ok(Transition::Unchanged),
            (current, requested) => Err(ProtocolError::RoleConflict {
                surface,
                current: current.name(),
                requested: requested.name(),
            }),
        }
    }
}
