use glam::Vec2;

/// Arithmetic mean of the four corners.
#[inline]
pub fn quad_center(quad: &[Vec2; 4]) -> Vec2 {
    (quad[0] + quad[1] + quad[2] + quad[3]) * 0.25
}

/// Whether consecutive edge cross products all share a sign.
///
/// Collinear (zero-cross) edges are tolerated; a quad that has collapsed to
/// a line still counts as convex for the purpose of the containment test.
pub fn quad_is_convex(quad: &[Vec2; 4]) -> bool {
    edge_cross_signs(quad).is_some()
}

/// Point-in-convex-quad via the cross-product sign test.
///
/// Requires consistent winding (either direction); points exactly on an edge
/// count as inside.
pub fn point_in_convex_quad(p: Vec2, quad: &[Vec2; 4]) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let cross = (b - a).perp_dot(p - a);
        if cross == 0.0 {
            continue; // on the edge
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if sign != cross.signum() {
            return false;
        }
    }
    true
}

/// `Some(sign)` if all non-zero consecutive edge crosses agree, else `None`.
fn edge_cross_signs(quad: &[Vec2; 4]) -> Option<f32> {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let c = quad[(i + 2) % 4];
        let cross = (b - a).perp_dot(c - b);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if sign != cross.signum() {
            return None;
        }
    }
    Some(sign)
}
