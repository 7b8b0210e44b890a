use rayon::prelude::*;
use tracing::debug;

use crate::config::{MeshConfig, OperatorScaling};
use crate::geometry::Grid;
use crate::math::transverse_axes;
use crate::model::{MaterialData, MaterialTable, ShapeId};

/// The seven diagonal operator vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// Primary edge lengths.
    Ds,
    /// Primary face areas.
    Da,
    /// Dual edge lengths.
    DualDs,
    /// Dual face areas.
    DualDa,
    /// Averaged permittivity on primary edges.
    Deps,
    /// Averaged conductivity on primary edges.
    Dsigma,
    /// Averaged permeability on primary faces.
    Dmu,
}

impl OperatorKind {
    pub const ALL: [Self; 7] = [
        Self::Ds,
        Self::Da,
        Self::DualDs,
        Self::DualDa,
        Self::Deps,
        Self::Dsigma,
        Self::Dmu,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ds => "Ds",
            Self::Da => "Da",
            Self::DualDs => "DualDs",
            Self::DualDa => "DualDa",
            Self::Deps => "Deps",
            Self::Dsigma => "Dsigma",
            Self::Dmu => "Dmu",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Value statistics of one operator vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Number of exact zeros.
    pub zeros: usize,
}

impl MatrixSummary {
    /// Summarizes `values`; an empty slice gives all zeros.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                zeros: 0,
            };
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let zeros = values.iter().filter(|v| **v == 0.0).count();
        Self {
            min,
            max,
            mean,
            zeros,
        }
    }
}

/// Assembled operator vectors, each of length `3 * cell_count`.
///
/// Entry `a * N + c` belongs to the primary edge along axis `a` (or the
/// primary face normal to `a`) anchored at the lower corner of cell `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorMatrices {
    cell_count: usize,
    vectors: [Vec<f64>; 7],
    summaries: Vec<(OperatorKind, MatrixSummary)>,
}

impl OperatorMatrices {
    /// Wraps precomputed vectors, in [`OperatorKind::ALL`] order.
    #[must_use]
    pub fn from_vectors(cell_count: usize, vectors: [Vec<f64>; 7]) -> Self {
        Self {
            cell_count,
            vectors,
            summaries: Vec::new(),
        }
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// The vector of one kind.
    #[must_use]
    pub fn get(&self, kind: OperatorKind) -> &[f64] {
        &self.vectors[kind.slot()]
    }

    /// Value at the entry for `axis` and `cell`.
    #[must_use]
    pub fn value(&self, kind: OperatorKind, axis: usize, cell: usize) -> f64 {
        self.get(kind)[axis * self.cell_count + cell]
    }

    /// All vectors with their kinds.
    pub fn iter(&self) -> impl Iterator<Item = (OperatorKind, &[f64])> {
        OperatorKind::ALL
            .iter()
            .map(move |&kind| (kind, self.get(kind)))
    }

    /// Summaries computed during assembly; empty unless requested.
    #[must_use]
    pub fn summaries(&self) -> &[(OperatorKind, MatrixSummary)] {
        &self.summaries
    }

    /// Summary of one kind, if computed.
    #[must_use]
    pub fn summary(&self, kind: OperatorKind) -> Option<&MatrixSummary> {
        self.summaries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, s)| s)
    }
}

/// What lies in a neighbouring cell position.
#[derive(Clone, Copy)]
enum Neighbor<'m> {
    OutsideGrid,
    Background(&'m MaterialData),
    Shape(&'m MaterialData),
}

impl<'m> Neighbor<'m> {
    fn material(self) -> Option<&'m MaterialData> {
        match self {
            Self::OutsideGrid => None,
            Self::Background(m) | Self::Shape(m) => Some(m),
        }
    }
}

/// Builds the operator vectors from a grid and its fill.
pub struct AssembleOperators<'a> {
    grid: &'a Grid,
    fill: &'a [Option<ShapeId>],
    materials: &'a MaterialTable,
    background: &'a MaterialData,
    scaling: OperatorScaling,
    summarize: bool,
}

impl<'a> AssembleOperators<'a> {
    /// Creates a new `AssembleOperators` operation.
    #[must_use]
    pub fn new(
        grid: &'a Grid,
        fill: &'a [Option<ShapeId>],
        materials: &'a MaterialTable,
        config: &'a MeshConfig,
    ) -> Self {
        Self {
            grid,
            fill,
            materials,
            background: &config.background_material,
            scaling: config.operator_scaling,
            summarize: config.visualize_matrices,
        }
    }

    /// Assembles all seven vectors.
    #[must_use]
    pub fn execute(&self) -> OperatorMatrices {
        let n = self.grid.cell_count();
        let vectors = OperatorKind::ALL.map(|kind| self.assemble(kind));
        let mut matrices = OperatorMatrices::from_vectors(n, vectors);
        if self.summarize {
            matrices.summaries = OperatorKind::ALL
                .iter()
                .map(|&kind| {
                    let summary = MatrixSummary::of(matrices.get(kind));
                    debug!(
                        operator = kind.name(),
                        min = summary.min,
                        max = summary.max,
                        mean = summary.mean,
                        zeros = summary.zeros,
                        "operator summary"
                    );
                    (kind, summary)
                })
                .collect();
        }
        matrices
    }

    fn assemble(&self, kind: OperatorKind) -> Vec<f64> {
        let n = self.grid.cell_count();
        let [cx, cy, _] = self.grid.cell_counts();
        let slice_len = cx * cy;
        let mut values = vec![0.0; 3 * n];
        for (axis, block) in values.chunks_mut(n).enumerate() {
            block
                .par_chunks_mut(slice_len)
                .enumerate()
                .for_each(|(k, slice)| {
                    for (offset, value) in slice.iter_mut().enumerate() {
                        let cell = [offset % cx, offset / cx, k];
                        *value = self.entry(kind, axis, cell);
                    }
                });
        }
        values
    }

    fn entry(&self, kind: OperatorKind, a: usize, cell: [usize; 3]) -> f64 {
        let (u, v) = transverse_axes(a);
        let c = cell.map(signed);
        match kind {
            OperatorKind::Ds => {
                if self.edge_cells(a, c).any(|n| is_pec(n.1)) {
                    0.0
                } else {
                    self.scaled(|| self.grid.step(a, cell[a]))
                }
            }
            OperatorKind::Da => {
                let pec = [-1, 0].iter().any(|&d| is_pec(self.neighbor(offset(c, a, d))));
                if pec {
                    0.0
                } else {
                    self.scaled(|| self.grid.step(u, cell[u]) * self.grid.step(v, cell[v]))
                }
            }
            OperatorKind::DualDs => self.scaled(|| self.dual_step(a, c[a])),
            OperatorKind::DualDa => {
                self.scaled(|| self.dual_step(u, c[u]) * self.dual_step(v, c[v]))
            }
            OperatorKind::Deps => self.edge_average(a, c, |m| m.permittivity),
            OperatorKind::Dsigma => self.edge_average(a, c, |m| m.conductivity),
            OperatorKind::Dmu => self.face_permeability(a, c),
        }
    }

    fn scaled(&self, geometric: impl FnOnce() -> f64) -> f64 {
        match self.scaling {
            OperatorScaling::Unit => 1.0,
            OperatorScaling::Geometric => geometric(),
        }
    }

    fn dual_step(&self, axis: usize, i: isize) -> f64 {
        0.5 * (self.grid.step_or_zero(axis, i - 1) + self.grid.step_or_zero(axis, i))
    }

    fn neighbor(&self, cell: [isize; 3]) -> Neighbor<'a> {
        let counts = self.grid.cell_counts();
        let mut coords = [0usize; 3];
        for a in 0..3 {
            match usize::try_from(cell[a]) {
                Ok(i) if i < counts[a] => coords[a] = i,
                _ => return Neighbor::OutsideGrid,
            }
        }
        match self.fill[self.grid.cell_index(coords)] {
            None => Neighbor::Background(self.background),
            Some(shape) => self
                .materials
                .get(shape)
                .map_or(Neighbor::Background(self.background), Neighbor::Shape),
        }
    }

    /// The up to four cells sharing the primary edge along `a` at `c`, with
    /// the area weight each contributes.
    fn edge_cells(
        &self,
        a: usize,
        c: [isize; 3],
    ) -> impl Iterator<Item = (f64, Neighbor<'a>)> + '_ {
        let (u, v) = transverse_axes(a);
        [(-1, -1), (0, -1), (-1, 0), (0, 0)]
            .into_iter()
            .map(move |(du, dv)| {
                let cell = offset(offset(c, u, du), v, dv);
                let weight =
                    self.grid.step_or_zero(u, cell[u]) * self.grid.step_or_zero(v, cell[v]);
                (weight, self.neighbor(cell))
            })
    }

    fn edge_average(
        &self,
        a: usize,
        c: [isize; 3],
        value: impl Fn(&MaterialData) -> f64,
    ) -> f64 {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for (weight, neighbor) in self.edge_cells(a, c) {
            if let Some(material) = neighbor.material() {
                weighted += weight * value(material);
                total += weight;
            }
        }
        if total > 0.0 {
            weighted / total
        } else {
            0.0
        }
    }

    fn face_permeability(&self, a: usize, c: [isize; 3]) -> f64 {
        let below = offset(c, a, -1);
        let (Neighbor::Shape(m1), Neighbor::Shape(m2)) = (self.neighbor(below), self.neighbor(c))
        else {
            return 0.0;
        };
        if m1.permeability <= 0.0 || m2.permeability <= 0.0 {
            return 0.0;
        }
        let d1 = self.grid.step_or_zero(a, below[a]);
        let d2 = self.grid.step_or_zero(a, c[a]);
        (d1 + d2) / (d1 / m1.permeability + d2 / m2.permeability)
    }
}

fn is_pec(neighbor: Neighbor<'_>) -> bool {
    neighbor.material().is_some_and(|m| m.is_pec)
}

fn offset(mut cell: [isize; 3], axis: usize, delta: isize) -> [isize; 3] {
    cell[axis] += delta;
    cell
}

#[allow(clippy::cast_possible_wrap)]
fn signed(i: usize) -> isize {
    i as isize
}
