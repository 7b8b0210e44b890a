//! Mesh configuration and tunable tolerances.

use crate::error::ConfigError;
use crate::model::{MaterialData, Properties};

/// Default merge distance for ray hits at shared edges and vertices.
pub const DEFAULT_RAY_HIT_MERGE: f64 = 1e-4;

/// Default triangle/box overlap tolerance relative to the grid diagonal.
pub const DEFAULT_BOX_OVERLAP_RELATIVE: f64 = 1e-6;

pub const PROP_BACKGROUND_MODE: &str = "Background extension mode";
pub const PROP_BACKGROUND_AMOUNT: &str = "Background extension";
pub const PROP_MAX_EDGE_LENGTH: &str = "Max edge length";
pub const PROP_STEPS_ALONG_DIAGONAL: &str = "Steps along diagonal";
pub const PROP_CONFORMAL: &str = "Conformal meshing";
pub const PROP_VISUALIZE_MATRICES: &str = "Visualize matrices";

/// Per-face property names, in `-x, +x, -y, +y, -z, +z` order.
const PROP_BACKGROUND_FACES: [&str; 6] = [
    "Background extension -X",
    "Background extension +X",
    "Background extension -Y",
    "Background extension +Y",
    "Background extension -Z",
    "Background extension +Z",
];

/// How the background region around the shapes is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionMode {
    /// The domain is the shapes' bounding box.
    #[default]
    None,
    /// Each face moves out by a fraction of the domain extent along its axis.
    Relative,
    /// Each face moves out by a distance in model units.
    Absolute,
}

/// Background extension of the meshing domain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BackgroundExtension {
    pub mode: ExtensionMode,
    /// Amounts for the `-x, +x, -y, +y, -z, +z` faces.
    pub faces: [f64; 6],
}

impl BackgroundExtension {
    /// Same amount on every face.
    #[must_use]
    pub fn uniform(mode: ExtensionMode, amount: f64) -> Self {
        Self {
            mode,
            faces: [amount; 6],
        }
    }

    /// Distance the face `side` (0 = min, 1 = max) of `axis` moves outward for
    /// a domain of the given extent along that axis.
    #[must_use]
    pub fn offset(&self, axis: usize, side: usize, extent: f64) -> f64 {
        let amount = self.faces[2 * axis + side];
        match self.mode {
            ExtensionMode::None => 0.0,
            ExtensionMode::Relative => amount * extent,
            ExtensionMode::Absolute => amount,
        }
    }
}

/// Scaling of the geometric operator vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatorScaling {
    /// Every geometric entry starts at 1.
    #[default]
    Unit,
    /// Entries hold true edge lengths and face areas.
    Geometric,
}

/// Hand-tuned tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Ray hits closer than this along the ray count once.
    pub ray_hit_merge: f64,
    /// Triangle/box overlap slack as a fraction of the grid diagonal.
    pub box_overlap_relative: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            ray_hit_merge: DEFAULT_RAY_HIT_MERGE,
            box_overlap_relative: DEFAULT_BOX_OVERLAP_RELATIVE,
        }
    }
}

/// Parameters of one mesh build.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshConfig {
    /// Background region around the shapes.
    pub background: BackgroundExtension,
    /// Upper bound on any grid step.
    pub max_edge_length: f64,
    /// Number of grid lines along the axis with the largest extent.
    pub steps_along_diagonal: usize,
    /// Snap boundary nodes onto the shape surfaces.
    pub conformal: bool,
    /// Compute and log summaries of the operator vectors.
    pub visualize_matrices: bool,
    /// Scaling of `Ds`, `Da`, `DualDs`, `DualDa`.
    pub operator_scaling: OperatorScaling,
    /// Material of cells no shape claims.
    pub background_material: MaterialData,
    /// Mark conformal nodes fixed once projected, so lower-priority shapes
    /// cannot move them again.
    pub lock_projected_nodes: bool,
    pub tolerances: Tolerances,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            background: BackgroundExtension::default(),
            max_edge_length: f64::INFINITY,
            steps_along_diagonal: 20,
            conformal: false,
            visualize_matrices: false,
            operator_scaling: OperatorScaling::default(),
            background_material: MaterialData::vacuum(),
            lock_projected_nodes: false,
            tolerances: Tolerances::default(),
        }
    }
}

impl MeshConfig {
    /// Reads a configuration from named properties, starting from the
    /// defaults for anything not present.
    ///
    /// # Errors
    ///
    /// Returns an error if a property has the wrong type or an invalid value.
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(mode) = props.text(PROP_BACKGROUND_MODE)? {
            config.background.mode = match mode.to_ascii_lowercase().as_str() {
                "none" => ExtensionMode::None,
                "relative" => ExtensionMode::Relative,
                "absolute" => ExtensionMode::Absolute,
                other => {
                    return Err(invalid(
                        PROP_BACKGROUND_MODE,
                        format!("unknown mode '{other}'"),
                    ))
                }
            };
        }
        if let Some(amount) = props.double(PROP_BACKGROUND_AMOUNT)? {
            config.background.faces = [amount; 6];
        }
        for (face, name) in PROP_BACKGROUND_FACES.iter().enumerate() {
            if let Some(amount) = props.double(name)? {
                config.background.faces[face] = amount;
            }
        }
        if let Some(length) = props.double(PROP_MAX_EDGE_LENGTH)? {
            config.max_edge_length = length;
        }
        if let Some(steps) = props.integer(PROP_STEPS_ALONG_DIAGONAL)? {
            config.steps_along_diagonal = usize::try_from(steps)
                .map_err(|_| invalid(PROP_STEPS_ALONG_DIAGONAL, "must not be negative"))?;
        }
        if let Some(conformal) = props.bool(PROP_CONFORMAL)? {
            config.conformal = conformal;
        }
        if let Some(visualize) = props.bool(PROP_VISUALIZE_MATRICES)? {
            config.visualize_matrices = visualize;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending property.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_edge_length.is_nan() || self.max_edge_length <= 0.0 {
            return Err(invalid(PROP_MAX_EDGE_LENGTH, "must be positive"));
        }
        if self.steps_along_diagonal < 2 {
            return Err(invalid(PROP_STEPS_ALONG_DIAGONAL, "must be at least 2"));
        }
        if self
            .background
            .faces
            .iter()
            .any(|a| !a.is_finite() || *a < 0.0)
        {
            return Err(invalid(
                PROP_BACKGROUND_AMOUNT,
                "must be finite and not negative",
            ));
        }
        if !(self.tolerances.ray_hit_merge >= 0.0 && self.tolerances.box_overlap_relative >= 0.0) {
            return Err(invalid("tolerances", "must not be negative"));
        }
        Ok(())
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidProperty {
        name: name.to_owned(),
        reason: reason.into(),
    }
}
