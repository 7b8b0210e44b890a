use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::Tolerances;
use crate::error::{GeometryError, Result};
use crate::geometry::{CellRange, Grid};
use crate::model::{ShapeData, ShapeId};
use crate::raycast::PointClassifier;

use super::fill_code::{FRONT, INSIDE, OUTSIDE, SURFACE, UNKNOWN};
use super::{CellFill, CellTriangleIndex, MeshTree};

/// Unordered pairs of equal-priority shapes that claimed the same cell, in
/// first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapSet {
    pairs: Vec<(ShapeId, ShapeId)>,
}

impl OverlapSet {
    /// Records the pair; returns `false` if it was already present in
    /// either order.
    pub fn insert(&mut self, a: ShapeId, b: ShapeId) -> bool {
        if self.contains(a, b) {
            return false;
        }
        self.pairs.push((a, b));
        true
    }

    /// `true` if the pair was recorded in either order.
    #[must_use]
    pub fn contains(&self, a: ShapeId, b: ShapeId) -> bool {
        self.pairs
            .iter()
            .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ShapeId, ShapeId)> {
        self.pairs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Counters collected while filling one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillStats {
    pub shape: ShapeId,
    /// Cells touched by the surface.
    pub surface_cells: usize,
    /// Point classifications performed.
    pub ray_casts: usize,
    /// Cells classified inside the shape.
    pub inside_cells: usize,
    /// Inside cells the shape now owns.
    pub claimed_cells: usize,
}

/// Output of a completed volume fill.
#[derive(Debug, Clone)]
pub struct FillResult {
    pub fill: CellFill,
    pub overlaps: OverlapSet,
    pub stats: Vec<FillStats>,
    /// Present when triangle tracking was enabled.
    pub triangles: Option<CellTriangleIndex>,
}

/// Classifies every cell of a grid against a sequence of shapes.
///
/// Shapes are added one at a time. For each, the surface is rasterized,
/// cells far from the shape are discarded as outside, the remaining cells
/// are flood-filled from classified seeds and surface cells are classified
/// individually by their centroid. Inside cells are then claimed by priority.
/// The scratch and front arrays are allocated once and reused.
pub struct VolumeFill<'g> {
    grid: &'g Grid,
    tolerances: Tolerances,
    scratch: Vec<u8>,
    front: Vec<usize>,
    fill: CellFill,
    priorities: HashMap<ShapeId, f64>,
    overlaps: OverlapSet,
    stats: Vec<FillStats>,
    triangles: Option<CellTriangleIndex>,
}

impl<'g> VolumeFill<'g> {
    /// Creates a fill with every cell unassigned.
    #[must_use]
    pub fn new(grid: &'g Grid, tolerances: Tolerances) -> Self {
        let n = grid.cell_count();
        Self {
            grid,
            tolerances,
            scratch: vec![UNKNOWN; n],
            front: Vec::new(),
            fill: vec![None; n],
            priorities: HashMap::new(),
            overlaps: OverlapSet::default(),
            stats: Vec::new(),
            triangles: None,
        }
    }

    /// Records which triangles touch which cell, for conformal projection.
    #[must_use]
    pub fn with_triangle_tracking(mut self) -> Self {
        self.triangles = Some(CellTriangleIndex::new());
        self
    }

    /// Current cell assignment.
    #[must_use]
    pub fn fill(&self) -> &CellFill {
        &self.fill
    }

    /// Equal-priority overlaps seen so far.
    #[must_use]
    pub fn overlaps(&self) -> &OverlapSet {
        &self.overlaps
    }

    /// Fills one shape into the grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape has no triangles or its priority
    /// property is not numeric.
    pub fn add_shape(&mut self, id: ShapeId, shape: &ShapeData) -> Result<FillStats> {
        let priority = shape.mesh_priority()?;
        let bounds = shape
            .surface
            .bounding_box()
            .ok_or_else(|| GeometryError::EmptyShape(shape.name.clone()))?;
        let grid = self.grid;
        let delta = self.tolerances.box_overlap_relative * grid.diagonal();
        self.scratch.fill(UNKNOWN);

        let surface_cells = {
            let mut tree = MeshTree::new(grid, &mut self.scratch, delta);
            if let Some(index) = self.triangles.as_mut() {
                tree = tree.with_tracking(index, id);
            }
            for (t, triangle) in shape.surface.triangles().enumerate() {
                tree.render_triangle(t, &triangle);
            }
            tree.marked_cells()
        };

        let near = grid.cell_range(&bounds.inflated(delta)).map(|r| expand(grid, r));
        for (index, code) in self.scratch.iter_mut().enumerate() {
            let keep = near.is_some_and(|r| r.contains(grid.cell_coords(index)));
            if *code == UNKNOWN && !keep {
                *code = OUTSIDE;
            }
        }

        let classifier = PointClassifier::new(&shape.surface, self.tolerances.ray_hit_merge);
        let mut ray_casts = 0;
        for seed in 0..self.scratch.len() {
            if self.scratch[seed] != UNKNOWN {
                continue;
            }
            ray_casts += 1;
            let code = if classifier.is_inside(&grid.cell_center(grid.cell_coords(seed))) {
                INSIDE
            } else {
                OUTSIDE
            };
            flood_fill(grid, &mut self.scratch, &mut self.front, seed, code);
        }

        for index in 0..self.scratch.len() {
            if self.scratch[index] == SURFACE {
                ray_casts += 1;
                let inside = classifier.is_inside(&grid.cell_center(grid.cell_coords(index)));
                self.scratch[index] = if inside { INSIDE } else { OUTSIDE };
            }
        }
        drop(classifier);

        self.priorities.insert(id, priority);
        let mut inside_cells = 0;
        let mut claimed_cells = 0;
        for index in 0..self.scratch.len() {
            if self.scratch[index] != INSIDE {
                continue;
            }
            inside_cells += 1;
            if self.claim(index, id, priority) {
                claimed_cells += 1;
            }
        }

        let stats = FillStats {
            shape: id,
            surface_cells,
            ray_casts,
            inside_cells,
            claimed_cells,
        };
        debug!(
            shape = %shape.name,
            priority,
            surface_cells,
            ray_casts,
            inside_cells,
            claimed_cells,
            "filled shape"
        );
        self.stats.push(stats);
        Ok(stats)
    }

    /// Finishes the fill and hands out its results.
    #[must_use]
    pub fn finish(self) -> FillResult {
        FillResult {
            fill: self.fill,
            overlaps: self.overlaps,
            stats: self.stats,
            triangles: self.triangles,
        }
    }

    #[allow(clippy::float_cmp)]
    fn claim(&mut self, cell: usize, id: ShapeId, priority: f64) -> bool {
        let Some(existing) = self.fill[cell] else {
            self.fill[cell] = Some(id);
            return true;
        };
        if existing == id {
            return false;
        }
        let existing_priority = self.priorities.get(&existing).copied().unwrap_or(0.0);
        if priority > existing_priority {
            self.fill[cell] = Some(id);
            true
        } else {
            if priority == existing_priority && self.overlaps.insert(existing, id) {
                warn!(?existing, current = ?id, "shapes with equal priority overlap");
            }
            false
        }
    }
}

/// Grows a cell range by one cell on every side, clamped to the grid.
fn expand(grid: &Grid, range: CellRange) -> CellRange {
    let counts = grid.cell_counts();
    let mut out = range;
    for a in 0..3 {
        out.min[a] = range.min[a].saturating_sub(1);
        out.max[a] = (range.max[a] + 1).min(counts[a] - 1);
    }
    out
}

/// Six-connected fill of `code` over unknown cells, starting at `seed`.
fn flood_fill(grid: &Grid, scratch: &mut [u8], front: &mut Vec<usize>, seed: usize, code: u8) {
    front.clear();
    scratch[seed] = FRONT;
    front.push(seed);
    while let Some(cell) = front.pop() {
        scratch[cell] = code;
        for neighbor in grid.face_neighbors(cell) {
            if scratch[neighbor] == UNKNOWN {
                scratch[neighbor] = FRONT;
                front.push(neighbor);
            }
        }
    }
}
