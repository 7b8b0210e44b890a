//! Orchestration of a complete mesh build.

mod lock;
mod progress;

pub use lock::{UiLock, UiLockGuard};
pub use progress::{NullProgress, ProgressSink, TracingProgress};

use tracing::{error, info, instrument};

use crate::config::MeshConfig;
use crate::error::{ConfigError, GeometryError, Result};
use crate::geometry::{Grid, GridStatistics};
use crate::meshing::{
    extract_interfaces, AssembleOperators, CellFill, CellTriangleIndex, ComputeGridLines,
    ConformalMesh, FacetGroup, FillStats, OperatorMatrices, OverlapSet, ProjectionStats,
    VolumeFill,
};
use crate::model::{ModelStore, ShapeId};
use crate::output::{MeshDataId, MeshStore};

/// Boundary faces of a build, lattice-aligned or conformal.
#[derive(Debug, Clone)]
pub enum Interfaces {
    Lattice(Vec<FacetGroup>),
    Conformal(ConformalMesh),
}

impl Interfaces {
    /// Number of owner-pair groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        match self {
            Self::Lattice(groups) => groups.len(),
            Self::Conformal(mesh) => mesh.groups.len(),
        }
    }
}

/// Everything a build computes, before it is committed.
#[derive(Debug, Clone)]
pub struct MeshResult {
    pub grid: Grid,
    pub statistics: GridStatistics,
    pub fill: CellFill,
    pub overlaps: OverlapSet,
    pub fill_stats: Vec<FillStats>,
    pub interfaces: Interfaces,
    /// Present for conformal builds.
    pub projection: Option<ProjectionStats>,
    pub operators: OperatorMatrices,
    /// Input shapes with their names, in build order.
    pub shapes: Vec<(ShapeId, String)>,
}

/// Builds a Cartesian mesh for a list of shapes.
pub struct BuildMesh<'a> {
    shapes: Vec<ShapeId>,
    config: MeshConfig,
    lock: Option<&'a UiLock>,
}

impl<'a> BuildMesh<'a> {
    /// Creates a new `BuildMesh` operation. Shapes are filled in the given
    /// order.
    #[must_use]
    pub fn new(shapes: Vec<ShapeId>, config: MeshConfig) -> Self {
        Self {
            shapes,
            config,
            lock: None,
        }
    }

    /// Holds a level of `lock` while the build runs.
    #[must_use]
    pub fn with_lock(mut self, lock: &'a UiLock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Runs the pipeline in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, no shapes are
    /// given, a shape or material cannot be read, a shape has no triangles
    /// or indexes past its vertex buffer, or the meshing domain is flat or
    /// too finely resolved.
    #[instrument(skip_all, fields(shapes = self.shapes.len(), conformal = self.config.conformal))]
    pub fn run(&self, model: &ModelStore, progress: &mut dyn ProgressSink) -> Result<MeshResult> {
        let _guard = self.lock.map(UiLock::acquire);
        self.config.validate()?;
        if self.shapes.is_empty() {
            return Err(ConfigError::NoShapes.into());
        }
        let materials = model.material_table(&self.shapes)?;
        let mut inputs = Vec::with_capacity(self.shapes.len());
        for &id in &self.shapes {
            let shape = model.shape(id)?;
            if shape.surface.is_empty() {
                return Err(GeometryError::EmptyShape(shape.name.clone()).into());
            }
            shape.surface.validate()?;
            inputs.push((id, shape, shape.mesh_priority()?));
        }

        progress.status("Computing grid lines");
        progress.set_percent(5);
        let grid = ComputeGridLines::new(&self.config).execute(model, &self.shapes)?;
        let statistics = grid.statistics();
        info!(
            lines = ?statistics.line_counts,
            cells = statistics.cell_count,
            min_step = statistics.min_step,
            max_step = statistics.max_step,
            "grid ready"
        );

        progress.status("Filling volume");
        let mut fill = VolumeFill::new(&grid, self.config.tolerances);
        if self.config.conformal {
            fill = fill.with_triangle_tracking();
        }
        for (n, &(id, shape, _)) in inputs.iter().enumerate() {
            fill.add_shape(id, shape)?;
            progress.set_percent(percent_between(10, 70, n + 1, inputs.len()));
        }
        let filled = fill.finish();

        progress.status("Extracting interfaces");
        let (interfaces, projection) = if self.config.conformal {
            let mut mesh = ConformalMesh::extract(&grid, &filled.fill);
            let surfaces: Vec<_> = inputs
                .iter()
                .map(|&(id, shape, priority)| (id, &shape.surface, priority))
                .collect();
            let empty = CellTriangleIndex::new();
            let stats = mesh.project(
                &grid,
                &filled.fill,
                &surfaces,
                filled.triangles.as_ref().unwrap_or(&empty),
                self.config.lock_projected_nodes,
            );
            (Interfaces::Conformal(mesh), Some(stats))
        } else {
            (Interfaces::Lattice(extract_interfaces(&grid, &filled.fill)), None)
        };
        progress.set_percent(80);

        progress.status("Assembling operators");
        let operators =
            AssembleOperators::new(&grid, &filled.fill, &materials, &self.config).execute();
        progress.set_percent(95);

        info!(
            groups = interfaces.group_count(),
            overlaps = filled.overlaps.len(),
            "mesh built"
        );
        Ok(MeshResult {
            statistics,
            fill: filled.fill,
            overlaps: filled.overlaps,
            fill_stats: filled.stats,
            interfaces,
            projection,
            operators,
            shapes: inputs
                .iter()
                .map(|&(id, shape, _)| (id, shape.name.clone()))
                .collect(),
            grid,
        })
    }

    /// Runs the pipeline and commits the result to `store`.
    ///
    /// Failures are logged and reported to `progress` before they are
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns any error of [`BuildMesh::run`] or of the commit.
    pub fn execute(
        &self,
        model: &ModelStore,
        store: &mut MeshStore,
        progress: &mut dyn ProgressSink,
    ) -> Result<MeshDataId> {
        let outcome = self
            .run(model, progress)
            .and_then(|result| store.commit(result));
        match outcome {
            Ok(id) => {
                progress.set_percent(100);
                progress.status("Mesh build finished");
                Ok(id)
            }
            Err(err) => {
                error!(%err, "mesh build failed");
                progress.status(&format!("Mesh build failed: {err}"));
                Err(err)
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn percent_between(start: u8, end: u8, done: usize, total: usize) -> u8 {
    let span = usize::from(end - start);
    start + (span * done / total.max(1)).min(span) as u8
}
