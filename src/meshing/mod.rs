//! The mesh generation pipeline: rasterization, volume fill, interface
//! extraction, conformal projection and operator assembly.

mod conformal;
mod grid_lines;
mod interfaces;
mod mesh_tree;
mod operators;
mod volume_fill;

pub use conformal::{
    ConformalFacet, ConformalGroup, ConformalMesh, FacetRef, MeshNode, ProjectionStats,
};
pub use grid_lines::ComputeGridLines;
pub use interfaces::{extract_interfaces, FacetGroup, SignedFace};
pub use mesh_tree::{CellTriangleIndex, MeshTree};
pub use operators::{AssembleOperators, MatrixSummary, OperatorKind, OperatorMatrices};
pub use volume_fill::{FillResult, FillStats, OverlapSet, VolumeFill};

use crate::model::ShapeId;

/// Owner of every cell; `None` is background.
pub type CellFill = Vec<Option<ShapeId>>;

/// Per-cell scratch codes used while filling one shape.
pub mod fill_code {
    /// Not classified yet.
    pub const UNKNOWN: u8 = 0;
    /// Inside the current shape.
    pub const INSIDE: u8 = 1;
    /// Outside the current shape.
    pub const OUTSIDE: u8 = 2;
    /// Queued on the flood-fill front.
    pub const FRONT: u8 = 3;
    /// Touched by the shape's surface; resolved after the flood fill.
    pub const SURFACE: u8 = 4;
}
