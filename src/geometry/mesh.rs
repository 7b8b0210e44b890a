use crate::error::GeometryError;
use crate::math::Point3;

use super::Aabb;

/// A triangle mesh: vertex buffer plus index buffer.
///
/// Boundary surfaces of solids are expected to be closed and consistently
/// oriented. Nothing here checks that.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Creates a mesh from its buffers.
    #[must_use]
    pub fn new(vertices: Vec<Point3>, indices: Vec<[u32; 3]>) -> Self {
        Self { vertices, indices }
    }

    /// Closed, outward-oriented box surface of 12 triangles.
    #[must_use]
    pub fn axis_aligned_box(min: Point3, max: Point3) -> Self {
        let vertices = (0..8)
            .map(|corner| {
                Point3::new(
                    if corner & 1 == 0 { min.x } else { max.x },
                    if corner & 2 == 0 { min.y } else { max.y },
                    if corner & 4 == 0 { min.z } else { max.z },
                )
            })
            .collect();
        let indices = vec![
            // -z
            [0, 2, 3],
            [0, 3, 1],
            // +z
            [4, 5, 7],
            [4, 7, 6],
            // -y
            [0, 1, 5],
            [0, 5, 4],
            // +y
            [2, 6, 7],
            [2, 7, 3],
            // -x
            [0, 4, 6],
            [0, 6, 2],
            // +x
            [1, 3, 7],
            [1, 7, 5],
        ];
        Self { vertices, indices }
    }

    /// Closed octahedron with the given center and vertex distance.
    #[must_use]
    pub fn octahedron(center: Point3, radius: f64) -> Self {
        let vertices = vec![
            center + nalgebra::Vector3::new(radius, 0.0, 0.0),
            center + nalgebra::Vector3::new(-radius, 0.0, 0.0),
            center + nalgebra::Vector3::new(0.0, radius, 0.0),
            center + nalgebra::Vector3::new(0.0, -radius, 0.0),
            center + nalgebra::Vector3::new(0.0, 0.0, radius),
            center + nalgebra::Vector3::new(0.0, 0.0, -radius),
        ];
        let indices = vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        Self { vertices, indices }
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// `true` if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Checks that every index refers to an existing vertex.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::VertexOutOfRange`] for the first triangle
    /// with an index past the vertex buffer.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let vertex_count = self.vertices.len();
        for (triangle, corners) in self.indices.iter().enumerate() {
            if let Some(&vertex) = corners.iter().find(|&&v| v as usize >= vertex_count) {
                return Err(GeometryError::VertexOutOfRange {
                    triangle,
                    vertex,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Vertex positions of triangle `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` or one of the triangle's vertex indices is out of
    /// range. [`TriangleMesh::validate`] rules out the latter.
    #[must_use]
    pub fn triangle(&self, index: usize) -> [Point3; 3] {
        let [a, b, c] = self.indices[index];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Iterates over the triangles' vertex positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        (0..self.indices.len()).map(|i| self.triangle(i))
    }

    /// Bounding box of all referenced vertices, `None` for an empty mesh.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut aabb = Aabb::empty();
        for tri in self.triangles() {
            for v in &tri {
                aabb.expand_point(v);
            }
        }
        (!aabb.is_empty()).then_some(aabb)
    }

    /// Appends another mesh, offsetting its indices.
    ///
    /// # Panics
    ///
    /// Panics if the combined vertex count exceeds `u32::MAX`.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = u32::try_from(self.vertices.len()).unwrap_or(u32::MAX);
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(
            other
                .indices
                .iter()
                .map(|[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }
}

/// Bounding box of a single triangle.
#[must_use]
pub fn triangle_bounds(triangle: &[Point3; 3]) -> Aabb {
    let mut aabb = Aabb::empty();
    for v in triangle {
        aabb.expand_point(v);
    }
    aabb
}
