use std::collections::HashMap;

use crate::geometry::{triangle_bounds, Aabb, CellRange, Grid};
use crate::math::{triangle_box_overlap, Point3};
use crate::model::ShapeId;

use super::fill_code;

/// Triangles recorded per `(cell, shape)`, as indices into the shape's
/// surface mesh.
#[derive(Debug, Clone, Default)]
pub struct CellTriangleIndex {
    cells: HashMap<(usize, ShapeId), Vec<usize>>,
}

impl CellTriangleIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that triangle `triangle` of `shape` touches `cell`.
    pub fn push(&mut self, cell: usize, shape: ShapeId, triangle: usize) {
        self.cells.entry((cell, shape)).or_default().push(triangle);
    }

    /// Triangles of `shape` recorded for `cell`.
    #[must_use]
    pub fn get(&self, cell: usize, shape: ShapeId) -> &[usize] {
        self.cells.get(&(cell, shape)).map_or(&[], Vec::as_slice)
    }

    /// Number of `(cell, shape)` entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Rasterizes triangles into a per-cell scratch array.
///
/// Each triangle is tested against the box of a cell range; ranges that
/// overlap are split along every axis spanning more than one cell until
/// single cells remain, which are marked [`fill_code::SURFACE`]. Depth is
/// bounded by `log2` of the largest cell count.
pub struct MeshTree<'a> {
    grid: &'a Grid,
    scratch: &'a mut [u8],
    delta: f64,
    tracker: Option<(&'a mut CellTriangleIndex, ShapeId)>,
    marked: usize,
}

impl<'a> MeshTree<'a> {
    /// Creates a rasterizer writing into `scratch` (one byte per cell).
    ///
    /// `delta` is the absolute slack used by the box tests.
    #[must_use]
    pub fn new(grid: &'a Grid, scratch: &'a mut [u8], delta: f64) -> Self {
        debug_assert_eq!(scratch.len(), grid.cell_count());
        Self {
            grid,
            scratch,
            delta,
            tracker: None,
            marked: 0,
        }
    }

    /// Also record every `(cell, shape) -> triangle` contact in `index`.
    #[must_use]
    pub fn with_tracking(mut self, index: &'a mut CellTriangleIndex, shape: ShapeId) -> Self {
        self.tracker = Some((index, shape));
        self
    }

    /// Number of cells newly marked as surface so far.
    #[must_use]
    pub fn marked_cells(&self) -> usize {
        self.marked
    }

    /// Marks every cell the triangle touches.
    pub fn render_triangle(&mut self, index: usize, triangle: &[Point3; 3]) {
        let bounds = triangle_bounds(triangle);
        if let Some(range) = self.grid.cell_range(&bounds.inflated(self.delta)) {
            self.render_range(index, triangle, &bounds, range);
        }
    }

    fn render_range(
        &mut self,
        index: usize,
        triangle: &[Point3; 3],
        tri_bounds: &Aabb,
        range: CellRange,
    ) {
        if !self.overlaps(triangle, tri_bounds, &range) {
            return;
        }
        if range.is_single_cell() {
            self.mark(index, range.min);
            return;
        }

        // Up to two halves per axis; unsplittable axes keep one.
        let mut halves = [[(0, 0); 2]; 3];
        let mut counts = [1usize; 3];
        for a in 0..3 {
            let (lo, hi) = (range.min[a], range.max[a]);
            if hi > lo {
                let mid = lo + (hi - lo) / 2;
                halves[a] = [(lo, mid), (mid + 1, hi)];
                counts[a] = 2;
            } else {
                halves[a] = [(lo, hi); 2];
            }
        }
        for hx in &halves[0][..counts[0]] {
            for hy in &halves[1][..counts[1]] {
                for hz in &halves[2][..counts[2]] {
                    let sub = CellRange {
                        min: [hx.0, hy.0, hz.0],
                        max: [hx.1, hy.1, hz.1],
                    };
                    self.render_range(index, triangle, tri_bounds, sub);
                }
            }
        }
    }

    fn overlaps(&self, triangle: &[Point3; 3], tri_bounds: &Aabb, range: &CellRange) -> bool {
        let cell_box = self.grid.range_bounds(range);
        if !cell_box.inflated(self.delta).intersects(tri_bounds) {
            return false;
        }
        if cell_box.contains_aabb(&tri_bounds.inflated(self.delta)) {
            return true;
        }
        let half = cell_box.extent() * 0.5 + nalgebra::Vector3::repeat(self.delta);
        triangle_box_overlap(triangle, &cell_box.center(), &half)
    }

    fn mark(&mut self, triangle: usize, cell: [usize; 3]) {
        let cell = self.grid.cell_index(cell);
        if self.scratch[cell] != fill_code::SURFACE {
            self.scratch[cell] = fill_code::SURFACE;
            self.marked += 1;
        }
        if let Some((index, shape)) = self.tracker.as_mut() {
            index.push(cell, *shape, triangle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TriangleMesh;
    use slotmap::SlotMap;

    fn unit_grid(n: usize) -> Grid {
        #[allow(clippy::cast_precision_loss)]
        let lines: Vec<f64> = (0..=n).map(|i| i as f64).collect();
        Grid::new(lines.clone(), lines.clone(), lines).unwrap_or_else(|e| panic!("{e}"))
    }

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn horizontal_triangle_marks_its_layer() {
        let grid = unit_grid(8);
        let mut scratch = vec![0u8; grid.cell_count()];
        let mut tree = MeshTree::new(&grid, &mut scratch, 1e-9);
        tree.render_triangle(0, &[p(0.5, 0.5, 2.5), p(3.7, 0.5, 2.5), p(0.5, 3.7, 2.5)]);
        let marked = tree.marked_cells();

        for index in 0..grid.cell_count() {
            let [i, j, k] = grid.cell_coords(index);
            // Cells whose square meets x + y <= 4.2, x, y >= 0.5.
            let expected = k == 2 && i <= 3 && j <= 3 && i + j <= 4;
            assert_eq!(
                scratch[index] == fill_code::SURFACE,
                expected,
                "cell ({i}, {j}, {k})"
            );
        }
        assert_eq!(marked, 13);
    }

    #[test]
    fn box_surface_marks_shell_only() {
        let grid = unit_grid(6);
        let mesh = TriangleMesh::axis_aligned_box(p(1.5, 1.5, 1.5), p(4.5, 4.5, 4.5));
        let mut scratch = vec![0u8; grid.cell_count()];
        let mut tree = MeshTree::new(&grid, &mut scratch, 1e-9);
        for (i, tri) in mesh.triangles().enumerate() {
            tree.render_triangle(i, &tri);
        }
        for index in 0..grid.cell_count() {
            let c = grid.cell_coords(index);
            let within = c.iter().all(|&v| (1..=4).contains(&v));
            let on_shell = within && c.iter().any(|&v| v == 1 || v == 4);
            assert_eq!(scratch[index] == fill_code::SURFACE, on_shell, "cell {c:?}");
        }
    }

    #[test]
    fn tracking_records_triangles_per_cell() {
        let grid = unit_grid(4);
        let mut shapes: SlotMap<ShapeId, ()> = SlotMap::with_key();
        let shape = shapes.insert(());
        let mut scratch = vec![0u8; grid.cell_count()];
        let mut index = CellTriangleIndex::new();
        {
            let mut tree =
                MeshTree::new(&grid, &mut scratch, 1e-9).with_tracking(&mut index, shape);
            tree.render_triangle(7, &[p(0.2, 0.2, 0.5), p(0.8, 0.2, 0.5), p(0.2, 0.8, 0.5)]);
        }
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(0, shape), &[7]);
        assert!(index.get(1, shape).is_empty());
    }

    #[test]
    fn triangle_outside_grid_marks_nothing() {
        let grid = unit_grid(4);
        let mut scratch = vec![0u8; grid.cell_count()];
        let mut tree = MeshTree::new(&grid, &mut scratch, 1e-9);
        tree.render_triangle(0, &[p(5.0, 5.0, 5.0), p(6.0, 5.0, 5.0), p(5.0, 6.0, 5.0)]);
        assert_eq!(tree.marked_cells(), 0);
    }
}
