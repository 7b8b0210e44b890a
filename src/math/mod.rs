pub mod closest_point;
pub mod ray_triangle;
pub mod triangle_box;

pub use closest_point::closest_point_on_triangle;
pub use ray_triangle::ray_triangle_intersect;
pub use triangle_box::triangle_box_overlap;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns the local `(u, v)` axes for a sweep along axis `w`.
///
/// The triple `(u, v, w)` is a cyclic permutation of `(x, y, z)`, so
/// `u x v` points along `+w`.
#[inline]
#[must_use]
pub fn transverse_axes(w: usize) -> (usize, usize) {
    ((w + 1) % 3, (w + 2) % 3)
}

/// Unit vector along the given axis (`0 = x`, `1 = y`, `2 = z`).
#[inline]
#[must_use]
pub fn axis_vector(axis: usize) -> Vector3 {
    let mut v = Vector3::zeros();
    v[axis] = 1.0;
    v
}

/// Axis name used in messages.
#[inline]
#[must_use]
pub fn axis_name(axis: usize) -> char {
    match axis {
        0 => 'x',
        1 => 'y',
        _ => 'z',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transverse_axes_are_right_handed() {
        for w in 0..3 {
            let (u, v) = transverse_axes(w);
            let n = axis_vector(u).cross(&axis_vector(v));
            assert_eq!(n, axis_vector(w));
        }
    }
}
