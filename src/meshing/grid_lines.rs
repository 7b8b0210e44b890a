use tracing::debug;

use crate::config::MeshConfig;
use crate::error::{ConfigError, GeometryError, Result};
use crate::geometry::{Aabb, Grid};
use crate::math::axis_name;
use crate::model::{ModelStore, ShapeId};

/// Places the grid lines around a set of shapes.
///
/// The domain is the union of the shapes' bounding boxes, pushed outward per
/// face by the background extension. The axis with the largest extent gets
/// `steps_along_diagonal` lines, the other axes proportionally many cells
/// (at least one), and every axis is refined until no step exceeds
/// `max_edge_length`.
pub struct ComputeGridLines<'a> {
    config: &'a MeshConfig,
}

impl<'a> ComputeGridLines<'a> {
    /// Creates a new `ComputeGridLines` operation.
    #[must_use]
    pub fn new(config: &'a MeshConfig) -> Self {
        Self { config }
    }

    /// Computes the grid for the listed shapes.
    ///
    /// # Errors
    ///
    /// Returns an error if no shapes are listed, a shape cannot be read or
    /// has no triangles, or the resulting domain is flat.
    pub fn execute(&self, model: &ModelStore, shapes: &[ShapeId]) -> Result<Grid> {
        if shapes.is_empty() {
            return Err(ConfigError::NoShapes.into());
        }
        let mut bounds = Aabb::empty();
        for &id in shapes {
            let shape = model.shape(id)?;
            shape.surface.validate()?;
            let shape_bounds = shape
                .surface
                .bounding_box()
                .ok_or_else(|| GeometryError::EmptyShape(shape.name.clone()))?;
            bounds.expand_aabb(&shape_bounds);
        }
        self.from_bounds(&bounds)
    }

    /// Computes the grid for an explicit shape bounding box.
    ///
    /// # Errors
    ///
    /// Returns an error if the extended domain has zero extent along an axis,
    /// or the requested resolution gives more cells than a grid can hold.
    pub fn from_bounds(&self, bounds: &Aabb) -> Result<Grid> {
        let extent = bounds.extent();
        let mut domain = *bounds;
        for a in 0..3 {
            domain.min[a] -= self.config.background.offset(a, 0, extent[a]);
            domain.max[a] += self.config.background.offset(a, 1, extent[a]);
        }
        let extent = domain.extent();
        for a in 0..3 {
            if !(extent[a].is_finite() && extent[a] > 0.0) {
                return Err(GeometryError::Degenerate(format!(
                    "meshing domain has zero extent along {}",
                    axis_name(a)
                ))
                .into());
            }
        }

        let largest = extent.max();
        let base_cells = self.config.steps_along_diagonal.saturating_sub(1).max(1);
        let mut counts = [0usize; 3];
        for a in 0..3 {
            counts[a] = cells_along(
                extent[a],
                largest,
                base_cells,
                self.config.max_edge_length,
            )
            .ok_or_else(|| GeometryError::InvalidGridLines {
                axis: axis_name(a),
                reason: format!("more than {MAX_CELLS_PER_AXIS} cells requested"),
            })?;
        }
        let total = counts
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .filter(|&n| n <= MAX_CELLS);
        if total.is_none() {
            return Err(GeometryError::Degenerate(format!(
                "grid of {} x {} x {} cells exceeds {MAX_CELLS} cells",
                counts[0], counts[1], counts[2]
            ))
            .into());
        }

        let mut lines: [Vec<f64>; 3] = Default::default();
        for a in 0..3 {
            lines[a] = uniform_lines(domain.min[a], domain.max[a], counts[a]);
            debug!(
                axis = %axis_name(a),
                cells = counts[a],
                min = domain.min[a],
                max = domain.max[a],
                "placed grid lines"
            );
        }
        let [x, y, z] = lines;
        Grid::new(x, y, z)
    }
}

/// Upper bound on the cells along one axis.
const MAX_CELLS_PER_AXIS: usize = 1 << 20;

/// Upper bound on the total cell count of a grid.
const MAX_CELLS: usize = 1 << 30;

/// Cell count along one axis, `None` when it exceeds [`MAX_CELLS_PER_AXIS`].
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn cells_along(
    extent: f64,
    largest: f64,
    base_cells: usize,
    max_edge_length: f64,
) -> Option<usize> {
    let proportional = ((extent / largest) * base_cells as f64).round();
    let capped = if max_edge_length.is_finite() {
        (extent / max_edge_length).ceil()
    } else {
        0.0
    };
    let cells = proportional.max(capped).max(1.0);
    (cells.is_finite() && cells <= MAX_CELLS_PER_AXIS as f64).then_some(cells as usize)
}

#[allow(clippy::cast_precision_loss)]
fn uniform_lines(min: f64, max: f64, cells: usize) -> Vec<f64> {
    let step = (max - min) / cells as f64;
    let mut lines: Vec<f64> = (0..cells).map(|i| min + step * i as f64).collect();
    lines.push(max);
    lines
}
