//! Ray queries against one shape's triangulated surface.

mod bvh;
mod classify;

pub use bvh::TriangleBvh;
pub use classify::{merged_hit_count, PointClassifier};

use crate::math::{Point3, Vector3};

/// A single ray/triangle hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Ray parameter of the hit (a distance for unit directions).
    pub distance: f64,
    /// Index of the hit triangle in the scene's index buffer.
    pub primitive: usize,
}

/// A triangulated scene that reports every hit along a ray.
pub trait RayIntersector {
    /// All hits with `distance > 0`, sorted by ascending distance.
    fn intersect_all(&self, origin: &Point3, direction: &Vector3) -> Vec<RayHit>;
}
