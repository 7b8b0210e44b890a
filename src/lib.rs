pub mod build;
pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod meshing;
pub mod model;
pub mod output;
pub mod raycast;

pub use build::{BuildMesh, MeshResult, ProgressSink, UiLock};
pub use config::MeshConfig;
pub use error::{CartmeshError, Result};
pub use model::ModelStore;
pub use output::MeshStore;
