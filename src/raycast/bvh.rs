use crate::geometry::{triangle_bounds, Aabb};
use crate::math::{ray_triangle_intersect, Point3, Vector3};

use super::{RayHit, RayIntersector};

const MAX_LEAF_TRIANGLES: usize = 4;

#[derive(Debug, Clone)]
struct BvhNode {
    bounds: Aabb,
    /// Leaf: first triangle slot. Internal: left child.
    left_or_start: usize,
    /// Leaf: triangle count. Internal: right child.
    right_or_count: usize,
    is_leaf: bool,
}

/// Bounding volume hierarchy over a triangle soup.
///
/// Built once from a vertex and an index buffer; answers
/// [`RayIntersector::intersect_all`] with every hit along the ray.
#[derive(Debug, Clone)]
pub struct TriangleBvh {
    triangles: Vec<[Point3; 3]>,
    nodes: Vec<BvhNode>,
    /// Triangle order referenced by leaves.
    order: Vec<usize>,
}

impl TriangleBvh {
    /// Builds the hierarchy.
    ///
    /// # Panics
    ///
    /// Panics if an index refers past the end of `vertices`.
    #[must_use]
    pub fn new(vertices: &[Point3], indices: &[[u32; 3]]) -> Self {
        let triangles: Vec<[Point3; 3]> = indices
            .iter()
            .map(|[a, b, c]| {
                [
                    vertices[*a as usize],
                    vertices[*b as usize],
                    vertices[*c as usize],
                ]
            })
            .collect();
        let bounds: Vec<Aabb> = triangles.iter().map(triangle_bounds).collect();
        let centroids: Vec<Point3> = bounds.iter().map(Aabb::center).collect();
        let mut order: Vec<usize> = (0..triangles.len()).collect();
        let mut nodes = Vec::new();
        if !triangles.is_empty() {
            build_recursive(&mut nodes, &mut order, &bounds, &centroids, 0, triangles.len());
        }
        Self {
            triangles,
            nodes,
            order,
        }
    }

    /// Number of triangles in the scene.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

fn build_recursive(
    nodes: &mut Vec<BvhNode>,
    order: &mut [usize],
    bounds: &[Aabb],
    centroids: &[Point3],
    start: usize,
    end: usize,
) -> usize {
    let mut node_bounds = Aabb::empty();
    let mut centroid_bounds = Aabb::empty();
    for &t in &order[start..end] {
        node_bounds.expand_aabb(&bounds[t]);
        centroid_bounds.expand_point(&centroids[t]);
    }

    let count = end - start;
    let node_idx = nodes.len();
    nodes.push(BvhNode {
        bounds: node_bounds,
        left_or_start: start,
        right_or_count: count,
        is_leaf: true,
    });
    if count <= MAX_LEAF_TRIANGLES {
        return node_idx;
    }

    // Median split on the longest centroid axis.
    let extent = centroid_bounds.extent();
    let axis = extent.imax();
    if extent[axis] <= 0.0 {
        return node_idx;
    }
    let mid = start + count / 2;
    order[start..end].select_nth_unstable_by(count / 2, |&a, &b| {
        centroids[a][axis].total_cmp(&centroids[b][axis])
    });

    let left = build_recursive(nodes, order, bounds, centroids, start, mid);
    let right = build_recursive(nodes, order, bounds, centroids, mid, end);
    let node = &mut nodes[node_idx];
    node.is_leaf = false;
    node.left_or_start = left;
    node.right_or_count = right;
    node_idx
}

/// Slab test; `true` if the ray meets the box at some `t >= 0`.
fn ray_hits_box(origin: &Point3, inv_dir: &Vector3, bounds: &Aabb) -> bool {
    let mut t_min = 0.0_f64;
    let mut t_max = f64::INFINITY;
    for a in 0..3 {
        if inv_dir[a].is_infinite() {
            if origin[a] < bounds.min[a] || origin[a] > bounds.max[a] {
                return false;
            }
            continue;
        }
        let t0 = (bounds.min[a] - origin[a]) * inv_dir[a];
        let t1 = (bounds.max[a] - origin[a]) * inv_dir[a];
        t_min = t_min.max(t0.min(t1));
        t_max = t_max.min(t0.max(t1));
        if t_min > t_max {
            return false;
        }
    }
    true
}

impl RayIntersector for TriangleBvh {
    fn intersect_all(&self, origin: &Point3, direction: &Vector3) -> Vec<RayHit> {
        let mut hits = Vec::new();
        if self.nodes.is_empty() {
            return hits;
        }
        let inv_dir = direction.map(|d| 1.0 / d);

        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if !ray_hits_box(origin, &inv_dir, &node.bounds) {
                continue;
            }
            if node.is_leaf {
                let slots = node.left_or_start..node.left_or_start + node.right_or_count;
                for &t in &self.order[slots] {
                    if let Some(distance) =
                        ray_triangle_intersect(origin, direction, &self.triangles[t])
                    {
                        if distance > 0.0 {
                            hits.push(RayHit {
                                distance,
                                primitive: t,
                            });
                        }
                    }
                }
            } else {
                stack.push(node.left_or_start);
                stack.push(node.right_or_count);
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TriangleMesh;

    fn brute_force(mesh: &TriangleMesh, origin: &Point3, dir: &Vector3) -> Vec<usize> {
        let mut hits: Vec<(f64, usize)> = mesh
            .triangles()
            .enumerate()
            .filter_map(|(i, tri)| {
                ray_triangle_intersect(origin, dir, &tri)
                    .filter(|t| *t > 0.0)
                    .map(|t| (t, i))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, i)| i).collect()
    }

    fn many_boxes() -> TriangleMesh {
        let mut mesh = TriangleMesh::default();
        for i in 0..5 {
            for j in 0..5 {
                let x = f64::from(i) * 2.0;
                let y = f64::from(j) * 2.0;
                mesh.merge(&TriangleMesh::axis_aligned_box(
                    Point3::new(x, y, 0.0),
                    Point3::new(x + 1.0, y + 1.0, 1.0 + f64::from(i + j)),
                ));
            }
        }
        mesh
    }

    #[test]
    fn agrees_with_brute_force() {
        let mesh = many_boxes();
        let bvh = TriangleBvh::new(&mesh.vertices, &mesh.indices);
        assert_eq!(bvh.triangle_count(), 300);
        let dir = Vector3::z();
        for (x, y) in [(0.3, 0.6), (4.2, 2.7), (8.5, 8.3), (1.5, 1.5), (6.1, 0.2)] {
            let origin = Point3::new(x, y, -3.0);
            let got: Vec<usize> = bvh
                .intersect_all(&origin, &dir)
                .iter()
                .map(|h| h.primitive)
                .collect();
            assert_eq!(got, brute_force(&mesh, &origin, &dir), "ray at ({x}, {y})");
        }
    }

    #[test]
    fn hits_are_sorted_and_in_front() {
        let mesh = TriangleMesh::axis_aligned_box(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        let bvh = TriangleBvh::new(&mesh.vertices, &mesh.indices);
        let hits = bvh.intersect_all(&Point3::new(0.3, 0.6, -1.0), &Vector3::z());
        assert_eq!(hits.len(), 2);
        assert!((hits[0].distance - 1.0).abs() < 1e-12);
        assert!((hits[1].distance - 2.0).abs() < 1e-12);

        let hits = bvh.intersect_all(&Point3::new(0.3, 0.6, 0.5), &Vector3::z());
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn empty_scene_has_no_hits() {
        let bvh = TriangleBvh::new(&[], &[]);
        assert!(bvh
            .intersect_all(&Point3::origin(), &Vector3::z())
            .is_empty());
    }
}
