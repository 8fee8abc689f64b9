//! Placement transforms for virtual objects.

use glam::{Mat4, Quat, Vec3};

/// Pose of a virtual object, kept as translation, rotation and scale.
///
/// Objects are placed and nudged through their components; the scene only
/// ever sees the composed matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World position.
    pub translation: Vec3,
    /// World orientation.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// The pose at the world origin, unrotated and unscaled.
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// An unrotated pose at `translation`.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Creates a transform resting on a surface: positioned at `position`
    /// with its up axis aligned to the surface `normal`.
    #[must_use]
    pub fn on_surface(position: Vec3, normal: Vec3) -> Self {
        let up = normal.try_normalize().unwrap_or(Vec3::Y);
        Self {
            translation: position,
            rotation: Quat::from_rotation_arc(Vec3::Y, up),
            scale: Vec3::ONE,
        }
    }

    /// Decomposes a world matrix. Shear is lost.
    #[must_use]
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Composes the world matrix handed to the scene.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}
