use glam::{Vec2, Vec3};

/// Vertical field of view of the implied camera, in degrees.
pub const CAMERA_FOV_Y_DEG: f32 = 60.0;

/// Near plane distance. Kept for the record; z is never clipped here,
/// depth cues are the renderer's business.
pub const CAMERA_NEAR: f32 = 0.1;

/// Far plane distance. See [`CAMERA_NEAR`].
pub const CAMERA_FAR: f32 = 1000.0;

/// Maps a camera-space position to screen coordinates.
///
/// Pinhole mapping with `f = 1 / tan(fov/2)` and aspect `W/H`:
///
/// ```text
/// x' = (f/aspect · x + 1) · W/2
/// y' = (1 − f · y)        · H/2
/// ```
///
/// The mapping is linear in `x` and `y`: there is no perspective divide, so
/// with zero rotation axis-aligned rectangles stay axis-aligned. `z` passes
/// through untouched; the renderer turns it into scale and opacity cues.
pub fn project_to_screen(p: Vec3, viewport: Vec2) -> Vec2 {
    let aspect = viewport.x / viewport.y;
    let f = 1.0 / (CAMERA_FOV_Y_DEG.to_radians() * 0.5).tan();

    Vec2::new(
        (f / aspect * p.x + 1.0) * viewport.x * 0.5,
        (1.0 - f * p.y) * viewport.y * 0.5,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    #[test]
    fn origin_lands_at_the_canvas_center() {
        let s = project_to_screen(Vec3::ZERO, VIEWPORT);
        assert!((s - Vec2::new(640.0, 360.0)).length() < 1e-3);
    }

    #[test]
    fn linear_in_x_and_y() {
        // f(a) + f(b) - f(0) == f(a + b) for a linear-plus-offset map.
        let a = Vec3::new(0.25, -0.5, 0.0);
        let b = Vec3::new(-0.125, 0.75, 0.0);
        let fa = project_to_screen(a, VIEWPORT);
        let fb = project_to_screen(b, VIEWPORT);
        let f0 = project_to_screen(Vec3::ZERO, VIEWPORT);
        let fab = project_to_screen(a + b, VIEWPORT);
        assert!((fa + fb - f0 - fab).length() < 1e-3);
    }

    #[test]
    fn rectangles_stay_axis_aligned() {
        // Corners of an axis-aligned rectangle at z=0 project to corners of
        // an axis-aligned rectangle.
        let tl = project_to_screen(Vec3::new(-0.2, 0.3, 0.0), VIEWPORT);
        let tr = project_to_screen(Vec3::new(0.4, 0.3, 0.0), VIEWPORT);
        let bl = project_to_screen(Vec3::new(-0.2, -0.1, 0.0), VIEWPORT);
        let br = project_to_screen(Vec3::new(0.4, -0.1, 0.0), VIEWPORT);
        assert!((tl.y - tr.y).abs() < 1e-4);
        assert!((bl.y - br.y).abs() < 1e-4);
        assert!((tl.x - bl.x).abs() < 1e-4);
        assert!((tr.x - br.x).abs() < 1e-4);
    }

    #[test]
    fn z_does_not_affect_the_screen_position() {
        let near = project_to_screen(Vec3::new(0.1, 0.1, 0.0), VIEWPORT);
        let far = project_to_screen(Vec3::new(0.1, 0.1, 500.0), VIEWPORT);
        assert_eq!(near, far);
    }

    #[test]
    fn screen_y_grows_downward() {
        let up = project_to_screen(Vec3::new(0.0, 0.5, 0.0), VIEWPORT);
        let down = project_to_screen(Vec3::new(0.0, -0.5, 0.0), VIEWPORT);
        assert!(up.y < down.y);
    }
}
