use crate::error::{GeometryError, Result};
use crate::math::{axis_name, Point3, Vector3};

use super::Aabb;

/// A rectilinear, non-uniform grid defined by three coordinate line sets.
///
/// Cell `(i, j, k)` spans `[x_i, x_{i+1}] x [y_j, y_{j+1}] x [z_k, z_{k+1}]`
/// and has linear index `i + cx * (j + cy * k)` where `cx, cy` are the cell
/// counts along x and y. Lattice node `(i, j, k)` sits at `(x_i, y_j, z_k)`
/// with linear index `i + nx * (j + ny * k)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    lines: [Vec<f64>; 3],
}

/// Inclusive range of cell indices along the three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min: [usize; 3],
    pub max: [usize; 3],
}

impl CellRange {
    /// `true` if the range covers exactly one cell.
    #[must_use]
    pub fn is_single_cell(&self) -> bool {
        self.min == self.max
    }

    /// `true` if the cell coordinates lie inside the range.
    #[must_use]
    pub fn contains(&self, cell: [usize; 3]) -> bool {
        (0..3).all(|a| self.min[a] <= cell[a] && cell[a] <= self.max[a])
    }
}

/// Derived, read-only grid statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStatistics {
    /// Number of lines along x, y, z.
    pub line_counts: [usize; 3],
    /// Total number of cells.
    pub cell_count: usize,
    /// Smallest step width over all axes.
    pub min_step: f64,
    /// Largest step width over all axes.
    pub max_step: f64,
    /// `max_step / min_step`.
    pub step_ratio: f64,
}

impl Grid {
    /// Creates a grid from three coordinate arrays.
    ///
    /// # Errors
    ///
    /// Returns an error if an array has fewer than two entries, is not
    /// strictly increasing, or contains non-finite values.
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        let lines = [x, y, z];
        for (axis, coords) in lines.iter().enumerate() {
            if coords.len() < 2 {
                return Err(GeometryError::InvalidGridLines {
                    axis: axis_name(axis),
                    reason: format!("need at least 2 lines, got {}", coords.len()),
                }
                .into());
            }
            if coords.iter().any(|c| !c.is_finite()) {
                return Err(GeometryError::InvalidGridLines {
                    axis: axis_name(axis),
                    reason: "non-finite coordinate".into(),
                }
                .into());
            }
            if let Some(i) = coords.windows(2).position(|w| w[1] <= w[0]) {
                return Err(GeometryError::InvalidGridLines {
                    axis: axis_name(axis),
                    reason: format!("not strictly increasing at index {}", i + 1),
                }
                .into());
            }
        }
        Ok(Self { lines })
    }

    /// Coordinate lines along `axis`.
    #[must_use]
    pub fn lines(&self, axis: usize) -> &[f64] {
        &self.lines[axis]
    }

    /// Number of lines along each axis.
    #[must_use]
    pub fn line_counts(&self) -> [usize; 3] {
        [self.lines[0].len(), self.lines[1].len(), self.lines[2].len()]
    }

    /// Number of cells along each axis.
    #[must_use]
    pub fn cell_counts(&self) -> [usize; 3] {
        let [nx, ny, nz] = self.line_counts();
        [nx - 1, ny - 1, nz - 1]
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cell_counts().iter().product()
    }

    /// Total number of lattice nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.line_counts().iter().product()
    }

    /// Linear index of cell `(i, j, k)`.
    #[inline]
    #[must_use]
    pub fn cell_index(&self, cell: [usize; 3]) -> usize {
        let [cx, cy, _] = self.cell_counts();
        cell[0] + cx * (cell[1] + cy * cell[2])
    }

    /// Cell coordinates of a linear cell index.
    #[inline]
    #[must_use]
    pub fn cell_coords(&self, index: usize) -> [usize; 3] {
        let [cx, cy, _] = self.cell_counts();
        [index % cx, (index / cx) % cy, index / (cx * cy)]
    }

    /// Linear index of lattice node `(i, j, k)`.
    #[inline]
    #[must_use]
    pub fn node_index(&self, node: [usize; 3]) -> usize {
        let [nx, ny, _] = self.line_counts();
        node[0] + nx * (node[1] + ny * node[2])
    }

    /// Lattice coordinates of a linear node index.
    #[inline]
    #[must_use]
    pub fn node_coords(&self, index: usize) -> [usize; 3] {
        let [nx, ny, _] = self.line_counts();
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    /// Position of lattice node `(i, j, k)`.
    #[must_use]
    pub fn node_position(&self, node: [usize; 3]) -> Point3 {
        Point3::new(
            self.lines[0][node[0]],
            self.lines[1][node[1]],
            self.lines[2][node[2]],
        )
    }

    /// Centroid of cell `(i, j, k)`.
    #[must_use]
    pub fn cell_center(&self, cell: [usize; 3]) -> Point3 {
        let c = |a: usize| 0.5 * (self.lines[a][cell[a]] + self.lines[a][cell[a] + 1]);
        Point3::new(c(0), c(1), c(2))
    }

    /// Width of cell `i` along `axis`.
    #[inline]
    #[must_use]
    pub fn step(&self, axis: usize, i: usize) -> f64 {
        self.lines[axis][i + 1] - self.lines[axis][i]
    }

    /// Width of cell `i` along `axis`, or 0 when `i` is outside the grid.
    #[inline]
    #[must_use]
    pub fn step_or_zero(&self, axis: usize, i: isize) -> f64 {
        usize::try_from(i)
            .ok()
            .filter(|&i| i + 1 < self.lines[axis].len())
            .map_or(0.0, |i| self.step(axis, i))
    }

    /// Bounding box of the whole grid.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let first = |a: usize| self.lines[a][0];
        let last = |a: usize| self.lines[a][self.lines[a].len() - 1];
        Aabb::new(
            Point3::new(first(0), first(1), first(2)),
            Point3::new(last(0), last(1), last(2)),
        )
    }

    /// Length of the grid diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.bounds().diagonal()
    }

    /// Bounding box of a cell range.
    #[must_use]
    pub fn range_bounds(&self, range: &CellRange) -> Aabb {
        Aabb::new(
            Point3::new(
                self.lines[0][range.min[0]],
                self.lines[1][range.min[1]],
                self.lines[2][range.min[2]],
            ),
            Point3::new(
                self.lines[0][range.max[0] + 1],
                self.lines[1][range.max[1] + 1],
                self.lines[2][range.max[2] + 1],
            ),
        )
    }

    /// Index of the cell along `axis` containing coordinate `x`, clamped to
    /// the grid.
    #[must_use]
    pub fn locate(&self, axis: usize, x: f64) -> usize {
        let lines = &self.lines[axis];
        lines
            .partition_point(|&l| l <= x)
            .saturating_sub(1)
            .min(lines.len() - 2)
    }

    /// Range of cells touched by `aabb`, or `None` if the box misses the grid.
    #[must_use]
    pub fn cell_range(&self, aabb: &Aabb) -> Option<CellRange> {
        if !self.bounds().intersects(aabb) {
            return None;
        }
        let mut range = CellRange {
            min: [0; 3],
            max: [0; 3],
        };
        for a in 0..3 {
            range.min[a] = self.locate(a, aabb.min[a]);
            range.max[a] = self.locate(a, aabb.max[a]);
        }
        Some(range)
    }

    /// Indices of the up to six face neighbours of a cell.
    pub fn face_neighbors(&self, index: usize) -> impl Iterator<Item = usize> {
        let counts = self.cell_counts();
        let cell = self.cell_coords(index);
        let strides = [1, counts[0], counts[0] * counts[1]];
        (0..6).filter_map(move |dir| {
            let axis = dir / 2;
            if dir % 2 == 0 {
                (cell[axis] > 0).then(|| index - strides[axis])
            } else {
                (cell[axis] + 1 < counts[axis]).then(|| index + strides[axis])
            }
        })
    }

    /// Extent of the grid along each axis.
    #[must_use]
    pub fn extent(&self) -> Vector3 {
        self.bounds().extent()
    }

    /// Computes the derived statistics.
    #[must_use]
    pub fn statistics(&self) -> GridStatistics {
        let mut min_step = f64::INFINITY;
        let mut max_step = 0.0_f64;
        for lines in &self.lines {
            for w in lines.windows(2) {
                let step = w[1] - w[0];
                min_step = min_step.min(step);
                max_step = max_step.max(step);
            }
        }
        GridStatistics {
            line_counts: self.line_counts(),
            cell_count: self.cell_count(),
            min_step,
            max_step,
            step_ratio: max_step / min_step,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CartmeshError;

    fn grid() -> Grid {
        Grid::new(
            vec![0.0, 1.0, 3.0],
            vec![0.0, 2.0, 3.0, 4.0],
            vec![-1.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn counts() {
        let g = grid();
        assert_eq!(g.line_counts(), [3, 4, 2]);
        assert_eq!(g.cell_counts(), [2, 3, 1]);
        assert_eq!(g.cell_count(), 6);
        assert_eq!(g.node_count(), 24);
    }

    #[test]
    fn index_round_trip() {
        let g = grid();
        for index in 0..g.cell_count() {
            assert_eq!(g.cell_index(g.cell_coords(index)), index);
        }
        for index in 0..g.node_count() {
            assert_eq!(g.node_index(g.node_coords(index)), index);
        }
    }

    #[test]
    fn rejects_short_axis() {
        let err = Grid::new(vec![0.0], vec![0.0, 1.0], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            CartmeshError::Geometry(GeometryError::InvalidGridLines { axis: 'x', .. })
        ));
    }

    #[test]
    fn rejects_non_increasing() {
        let err = Grid::new(vec![0.0, 1.0], vec![0.0, 1.0, 1.0], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            CartmeshError::Geometry(GeometryError::InvalidGridLines { axis: 'y', .. })
        ));
    }

    #[test]
    fn locate_clamps() {
        let g = grid();
        assert_eq!(g.locate(0, -5.0), 0);
        assert_eq!(g.locate(0, 0.5), 0);
        assert_eq!(g.locate(0, 1.0), 1);
        assert_eq!(g.locate(0, 3.0), 1);
        assert_eq!(g.locate(0, 10.0), 1);
    }

    #[test]
    fn cell_range_of_box() {
        let g = grid();
        let aabb = Aabb::new(Point3::new(0.5, 2.5, 0.0), Point3::new(2.0, 3.5, 0.5));
        let range = g.cell_range(&aabb).unwrap();
        assert_eq!(range.min, [0, 1, 0]);
        assert_eq!(range.max, [1, 2, 0]);
        let outside = Aabb::new(Point3::new(5.0, 0.0, 0.0), Point3::new(6.0, 1.0, 0.0));
        assert!(g.cell_range(&outside).is_none());
    }

    #[test]
    fn neighbors_at_corner_and_interior() {
        let g = Grid::new(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![0.0, 1.0, 2.0, 3.0],
            vec![0.0, 1.0, 2.0, 3.0],
        )
        .unwrap();
        assert_eq!(g.face_neighbors(0).count(), 3);
        let center = g.cell_index([1, 1, 1]);
        let mut n: Vec<usize> = g.face_neighbors(center).collect();
        n.sort_unstable();
        assert_eq!(n, vec![4, 10, 12, 14, 16, 22]);
    }

    #[test]
    fn statistics_report_steps() {
        let stats = grid().statistics();
        assert_eq!(stats.cell_count, 6);
        assert!((stats.min_step - 1.0).abs() < 1e-12);
        assert!((stats.max_step - 2.0).abs() < 1e-12);
        assert!((stats.step_ratio - 2.0).abs() < 1e-12);
    }

    #[test]
    fn step_or_zero_outside() {
        let g = grid();
        assert!((g.step_or_zero(0, -1)).abs() < f64::EPSILON);
        assert!((g.step_or_zero(0, 1) - 2.0).abs() < f64::EPSILON);
        assert!((g.step_or_zero(0, 2)).abs() < f64::EPSILON);
    }
}
