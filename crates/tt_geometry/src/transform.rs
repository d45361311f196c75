use glam::{Mat4, Vec2, Vec3};

/// Position, rotation and scale of a text element relative to its anchor.
///
/// Rotation is Euler angles in degrees. Scale is 2D; text is a flat raster,
/// depth cues are applied separately at render time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Transform3D {
    pub position: Vec3,
    pub rotation_deg: Vec3,
    pub scale: Vec2,
}

impl Transform3D {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation_deg: Vec3::ZERO,
        scale: Vec2::ONE,
    };

    /// Composes into a single matrix, right-multiplying column vectors.
    ///
    /// Application order: scale, rotate X, rotate Y, rotate Z, translate.
    pub fn compose(&self) -> Mat4 {
        let scale = Mat4::from_scale(Vec3::new(self.scale.x, self.scale.y, 1.0));
        let rot_x = Mat4::from_rotation_x(self.rotation_deg.x.to_radians());
        let rot_y = Mat4::from_rotation_y(self.rotation_deg.y.to_radians());
        let rot_z = Mat4::from_rotation_z(self.rotation_deg.z.to_radians());
        let translate = Mat4::from_translation(self.position);

        translate * rot_z * rot_y * rot_x * scale
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}
