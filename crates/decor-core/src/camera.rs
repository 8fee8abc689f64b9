//! Camera pose and view frustum.
//!
//! The tracking supplier reports where the device camera is each frame. The
//! pose follows the usual right-handed convention: the camera looks down its
//! local -Z axis with +Y up.

use glam::{Mat4, Quat, Vec3, Vec4};

/// Pose and intrinsics of the tracked camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Position of the device camera in world space.
    pub position: Vec3,
    /// Camera orientation in world space.
    pub orientation: Quat,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Width over height of the camera image.
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl CameraPose {
    /// Creates a camera at the origin looking down -Z.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            fov: std::f32::consts::FRAC_PI_3, // 60 degrees
            aspect_ratio,
            near: 0.01,
            far: 1000.0,
        }
    }

    /// Creates a camera at `position` looking towards `target`.
    #[must_use]
    pub fn looking_at(aspect_ratio: f32, position: Vec3, target: Vec3, up: Vec3) -> Self {
        // look_at_rh builds world-to-camera; invert it for the camera orientation
        let view = Mat4::look_at_rh(position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        Self {
            position,
            orientation: rotation,
            ..Self::new(aspect_ratio)
        }
    }

    /// Sets the position and returns the updated pose.
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the orientation and returns the updated pose.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation.normalize();
        self
    }

    /// Returns the camera-to-world matrix.
    #[must_use]
    pub fn camera_to_world(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// Returns the view (world-to-camera) matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.camera_to_world().inverse()
    }

    /// Right-handed perspective projection with depth in [0, 1].
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Projection times view; the frustum is extracted from this.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Viewing direction in world space.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// Returns the visible volume of this camera.
    #[must_use]
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new(9.0 / 16.0)
    }
}

/// A plane in Hessian normal form.
///
/// Points with a positive signed distance lie on the side the normal points to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Offset along the normal.
    pub distance: f32,
}

impl Plane {
    /// Creates a plane from raw `(a, b, c, d)` coefficients, normalizing them.
    ///
    /// Degenerate coefficients yield a plane that keeps every point.
    #[must_use]
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.truncate();
        let length = normal.length();
        if length <= f32::EPSILON {
            return Self {
                normal: Vec3::ZERO,
                distance: 0.0,
            };
        }
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Positive on the inner side of the plane.
    #[must_use]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// A view frustum: six planes whose normals point inwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the frustum planes from a view-projection matrix.
    ///
    /// Expects a `[0, 1]` clip-space depth range, as produced by
    /// [`Mat4::perspective_rh`].
    #[must_use]
    pub fn from_view_projection(matrix: &Mat4) -> Self {
        let (r0, r1, r2, r3) = (matrix.row(0), matrix.row(1), matrix.row(2), matrix.row(3));
        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Returns whether `point` lies inside the frustum.
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
    }

    /// Returns whether an axis-aligned box overlaps the frustum.
    ///
    /// Conservative: boxes near a frustum corner may report an overlap that
    /// does not exist, never the reverse.
    #[must_use]
    pub fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        self.planes.iter().all(|p| {
            let positive = Vec3::select(p.normal.cmpge(Vec3::ZERO), max, min);
            p.signed_distance(positive) >= 0.0
        })
    }
}
