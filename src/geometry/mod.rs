mod aabb;
mod grid;
mod mesh;

pub use aabb::Aabb;
pub use grid::{CellRange, Grid, GridStatistics};
pub use mesh::{triangle_bounds, TriangleMesh};
