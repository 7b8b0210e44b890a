use thiserror::Error;

/// Top-level error type for the Cartesian mesher.
#[derive(Debug, Error)]
pub enum CartmeshError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Entity(#[from] EntityError),
}

/// Errors in the mesh configuration or in the selection of shapes.
///
/// These are detected before any cell is classified and abort the build.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no shapes selected for meshing")]
    NoShapes,

    #[error("shape '{shape}' has no valid material assigned")]
    MissingMaterial { shape: String },

    #[error("invalid property '{name}': {reason}")]
    InvalidProperty { name: String, reason: String },
}

/// Errors related to geometric input.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid grid lines along {axis}: {reason}")]
    InvalidGridLines { axis: char, reason: String },

    #[error("shape '{0}' has no triangles")]
    EmptyShape(String),

    #[error("triangle {triangle} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        triangle: usize,
        vertex: u32,
        vertex_count: usize,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors raised when an entity handle cannot be resolved or its data does
/// not fit together.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("inconsistent entity data: {0}")]
    Inconsistent(String),
}

/// Convenience type alias for results using [`CartmeshError`].
pub type Result<T> = std::result::Result<T, CartmeshError>;
