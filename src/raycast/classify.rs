use crate::geometry::TriangleMesh;
use crate::math::{Point3, Vector3};

use super::{RayHit, RayIntersector, TriangleBvh};

/// Inside/outside test for a point against one closed surface.
///
/// Casts a single ray along `+z` and counts crossings. Hits closer than
/// `merge_distance` to the previously counted hit are the same crossing seen
/// through adjacent triangles (a shared edge or vertex) and count once.
///
/// The surface must be closed and consistently oriented; open surfaces give
/// arbitrary answers.
pub struct PointClassifier<R = TriangleBvh> {
    scene: R,
    merge_distance: f64,
}

impl PointClassifier<TriangleBvh> {
    /// Builds a ray scene for `surface`.
    #[must_use]
    pub fn new(surface: &TriangleMesh, merge_distance: f64) -> Self {
        Self::with_scene(
            TriangleBvh::new(&surface.vertices, &surface.indices),
            merge_distance,
        )
    }
}

impl<R: RayIntersector> PointClassifier<R> {
    /// Wraps an existing ray scene.
    #[must_use]
    pub fn with_scene(scene: R, merge_distance: f64) -> Self {
        Self {
            scene,
            merge_distance,
        }
    }

    /// `true` if `point` lies inside the surface.
    #[must_use]
    pub fn is_inside(&self, point: &Point3) -> bool {
        let hits = self.scene.intersect_all(point, &Vector3::z());
        merged_hit_count(&hits, self.merge_distance) % 2 == 1
    }
}

/// Number of distinct crossings in a sorted hit list.
#[must_use]
pub fn merged_hit_count(hits: &[RayHit], merge_distance: f64) -> usize {
    let mut count = 0;
    let mut last = f64::NEG_INFINITY;
    for hit in hits {
        if hit.distance - last >= merge_distance {
            count += 1;
            last = hit.distance;
        }
    }
    count
}
