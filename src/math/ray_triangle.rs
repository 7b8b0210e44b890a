use super::{Point3, Vector3};

/// Barycentric slack so that rays through a shared edge or vertex hit every
/// triangle meeting there. Duplicates are merged by the caller.
const EDGE_EPSILON: f64 = 1e-9;

/// Intersects the ray `origin + t * direction` with a triangle.
///
/// Moller-Trumbore. Returns the ray parameter `t` of the hit (any sign), or
/// `None` when the ray misses or runs parallel to the triangle plane.
#[must_use]
pub fn ray_triangle_intersect(
    origin: &Point3,
    direction: &Vector3,
    triangle: &[Point3; 3],
) -> Option<f64> {
    let edge1 = triangle[1] - triangle[0];
    let edge2 = triangle[2] - triangle[0];

    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);
    let scale = edge1.norm() * edge2.norm() * direction.norm();
    if a.abs() <= 1e-12 * scale {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - triangle[0];
    let u = f * s.dot(&h);
    if !(-EDGE_EPSILON..=1.0 + EDGE_EPSILON).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < -EDGE_EPSILON || u + v > 1.0 + EDGE_EPSILON {
        return None;
    }

    Some(f * edge2.dot(&q))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn tri() -> [Point3; 3] {
        [p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(0.0, 1.0, 1.0)]
    }

    #[test]
    fn hit_in_front() {
        let t = ray_triangle_intersect(&p(0.2, 0.2, 0.0), &Vector3::z(), &tri()).unwrap();
        assert_relative_eq!(t, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn hit_behind_has_negative_parameter() {
        let t = ray_triangle_intersect(&p(0.2, 0.2, 3.0), &Vector3::z(), &tri()).unwrap();
        assert_relative_eq!(t, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn miss_outside() {
        assert!(ray_triangle_intersect(&p(0.8, 0.8, 0.0), &Vector3::z(), &tri()).is_none());
    }

    #[test]
    fn parallel_ray_misses() {
        assert!(ray_triangle_intersect(&p(0.2, 0.2, 1.0), &Vector3::x(), &tri()).is_none());
    }

    #[test]
    fn shared_edge_is_hit() {
        // (0.5, 0.5) lies on the hypotenuse.
        assert!(ray_triangle_intersect(&p(0.5, 0.5, 0.0), &Vector3::z(), &tri()).is_some());
    }
}
