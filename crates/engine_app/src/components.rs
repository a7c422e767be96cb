//! Components used by the demo simulation.

use engine_component::{component, tag};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation, and scale of a particle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Identity transform moved to `position`.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Translate by `offset`.
    #[must_use]
    pub fn translated(mut self, offset: Vec3) -> Self {
        self.position += offset;
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Linear velocity in units per second.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Velocity(pub Vec3);

/// Seconds left before the particle expires.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Lifetime(pub f32);

/// Particles that are not integrated this tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sleeping;

/// Particles whose lifetime ran out; removed at the end of the tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct Expired;

component!(Transform, Velocity, Lifetime);
tag!(Sleeping, Expired);
