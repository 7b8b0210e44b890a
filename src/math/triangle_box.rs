use super::{Point3, Vector3};

/// Exact triangle / axis-aligned box overlap test.
///
/// Separating axis test over the 13 candidate axes: the three box face
/// normals, the triangle normal, and the nine cross products of box axes
/// with triangle edges. Touching counts as overlapping.
#[must_use]
pub fn triangle_box_overlap(triangle: &[Point3; 3], center: &Point3, half: &Vector3) -> bool {
    // Move the box to the origin.
    let v = [
        triangle[0] - center,
        triangle[1] - center,
        triangle[2] - center,
    ];
    let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];

    for edge in &edges {
        for axis in 0..3 {
            let mut unit = Vector3::zeros();
            unit[axis] = 1.0;
            if separated_on_axis(&unit.cross(edge), &v, half) {
                return false;
            }
        }
    }

    for axis in 0..3 {
        let min = v[0][axis].min(v[1][axis]).min(v[2][axis]);
        let max = v[0][axis].max(v[1][axis]).max(v[2][axis]);
        if min > half[axis] || max < -half[axis] {
            return false;
        }
    }

    let normal = edges[0].cross(&edges[1]);
    let distance = normal.dot(&v[0]);
    distance.abs() <= projected_radius(&normal, half)
}

/// Radius of the box projected onto `axis`.
#[inline]
fn projected_radius(axis: &Vector3, half: &Vector3) -> f64 {
    half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs()
}

/// `true` if the triangle's and the box's projections on `axis` are disjoint.
///
/// A zero axis (parallel edge and box axis) never separates.
fn separated_on_axis(axis: &Vector3, v: &[Vector3; 3], half: &Vector3) -> bool {
    let p0 = axis.dot(&v[0]);
    let p1 = axis.dot(&v[1]);
    let p2 = axis.dot(&v[2]);
    let min = p0.min(p1).min(p2);
    let max = p0.max(p1).max(p2);
    let r = projected_radius(axis, half);
    min > r || max < -r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_box() -> (Point3, Vector3) {
        (p(0.0, 0.0, 0.0), Vector3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn triangle_through_box_overlaps() {
        let (c, h) = unit_box();
        let tri = [p(-2.0, -2.0, 0.0), p(2.0, -2.0, 0.0), p(0.0, 2.0, 0.0)];
        assert!(triangle_box_overlap(&tri, &c, &h));
    }

    #[test]
    fn triangle_inside_box_overlaps() {
        let (c, h) = unit_box();
        let tri = [p(-0.1, -0.1, 0.1), p(0.1, -0.1, 0.1), p(0.0, 0.1, -0.1)];
        assert!(triangle_box_overlap(&tri, &c, &h));
    }

    #[test]
    fn triangle_above_box_is_separated() {
        let (c, h) = unit_box();
        let tri = [p(-2.0, -2.0, 0.6), p(2.0, -2.0, 0.6), p(0.0, 2.0, 0.6)];
        assert!(!triangle_box_overlap(&tri, &c, &h));
    }

    #[test]
    fn diagonal_triangle_missing_corner_is_separated() {
        // The plane x + y + z = 1.6 passes beyond the corner (0.5, 0.5, 0.5),
        // but the triangle's bounding box still overlaps the box.
        let (c, h) = unit_box();
        let tri = [p(1.6, 0.0, 0.0), p(0.0, 1.6, 0.0), p(0.0, 0.0, 1.6)];
        assert!(!triangle_box_overlap(&tri, &c, &h));
    }

    #[test]
    fn diagonal_triangle_cutting_corner_overlaps() {
        let (c, h) = unit_box();
        let tri = [p(1.4, 0.0, 0.0), p(0.0, 1.4, 0.0), p(0.0, 0.0, 1.4)];
        assert!(triangle_box_overlap(&tri, &c, &h));
    }

    #[test]
    fn edge_axis_separates_triangle_near_corner() {
        // Coplanar with the box's mid plane and inside its bounding box
        // overlap, but entirely beyond the x + y = 1 corner: only an edge
        // cross product axis separates it.
        let (c, h) = unit_box();
        let tri = [p(0.7, 0.35, 0.0), p(0.35, 0.7, 0.0), p(1.0, 1.0, 0.0)];
        assert!(!triangle_box_overlap(&tri, &c, &h));
    }

    #[test]
    fn touching_face_counts_as_overlap() {
        let (c, h) = unit_box();
        let tri = [p(-1.0, -1.0, 0.5), p(1.0, -1.0, 0.5), p(0.0, 1.0, 0.5)];
        assert!(triangle_box_overlap(&tri, &c, &h));
    }
}
