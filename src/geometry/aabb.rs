use crate::math::{Point3, Vector3};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a bounding box from its two corners.
    #[must_use]
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// An inverted box that any point expands.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Bounding box of a set of points, `None` when the set is empty.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut aabb = Self::empty();
        for p in points {
            aabb.expand_point(p);
        }
        (!aabb.is_empty()).then_some(aabb)
    }

    /// `true` while no point has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        (0..3).any(|a| self.min[a] > self.max[a])
    }

    /// Grows the box to contain `point`.
    pub fn expand_point(&mut self, point: &Point3) {
        for a in 0..3 {
            self.min[a] = self.min[a].min(point[a]);
            self.max[a] = self.max[a].max(point[a]);
        }
    }

    /// Grows the box to contain `other`.
    pub fn expand_aabb(&mut self, other: &Aabb) {
        self.expand_point(&other.min);
        self.expand_point(&other.max);
    }

    /// Returns a copy grown by `margin` on every side.
    #[must_use]
    pub fn inflated(&self, margin: f64) -> Self {
        let m = Vector3::repeat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Box extent along each axis.
    #[must_use]
    pub fn extent(&self) -> Vector3 {
        self.max - self.min
    }

    /// Length of the box diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.extent().norm()
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// `true` if the boxes share at least one point.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        (0..3).all(|a| self.min[a] <= other.max[a] && other.min[a] <= self.max[a])
    }

    /// `true` if `other` lies completely inside this box.
    #[must_use]
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        (0..3).all(|a| self.min[a] <= other.min[a] && other.max[a] <= self.max[a])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn from_points_bounds_all() {
        let pts = [p(1.0, -2.0, 0.5), p(-1.0, 3.0, 0.0), p(0.0, 0.0, 4.0)];
        let aabb = Aabb::from_points(&pts).unwrap();
        assert_eq!(aabb.min, p(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, p(1.0, 3.0, 4.0));
    }

    #[test]
    fn from_no_points_is_none() {
        assert!(Aabb::from_points(&[]).is_none());
    }

    #[test]
    fn containment_and_intersection() {
        let outer = Aabb::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0));
        let inner = Aabb::new(p(0.5, 0.5, 0.5), p(1.0, 1.0, 1.0));
        let apart = Aabb::new(p(3.0, 0.0, 0.0), p(4.0, 1.0, 1.0));
        assert!(outer.contains_aabb(&inner));
        assert!(!inner.contains_aabb(&outer));
        assert!(outer.intersects(&inner));
        assert!(!outer.intersects(&apart));
        assert!(outer.inflated(1.0).intersects(&apart));
    }
}
