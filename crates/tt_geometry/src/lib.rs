//! The stateless geometry kernel of tracktext.
//!
//! * [`Transform3D`]: position / Euler rotation / 2D scale, with a fixed
//!   composition order.
//! * [`Homography`]: a row-major 3×3 plane-to-plane projective transform.
//! * [`project_to_screen`]: the pinhole screen mapping used for text
//!   placement.
//! * [`point_in_convex_quad`] and friends; convex-quad predicates.
//!
//! Matrix layout is uniform across the workspace: 4×4 matrices are
//! column-major ([`glam::Mat4`]), 3×3 homographies are row-major `[f32; 9]`
//! (matching the convention of the vision primitives that estimate them).

mod homography;
mod projection;
mod quad;
mod transform;

pub use self::homography::Homography;
pub use self::projection::{CAMERA_FAR, CAMERA_FOV_Y_DEG, CAMERA_NEAR, project_to_screen};
pub use self::quad::{point_in_convex_quad, quad_center, quad_is_convex};
pub use self::transform::Transform3D;
