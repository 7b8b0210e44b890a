use crate::error::ConfigError;
use crate::geometry::TriangleMesh;

use super::material::MaterialId;
use super::properties::{Properties, PropertyValue};

slotmap::new_key_type! {
    /// Unique identifier for a shape in the model store.
    pub struct ShapeId;
}

/// Name of the property holding a shape's mesh priority.
pub const MESH_PRIORITY: &str = "Mesh priority";

/// A solid given by its triangulated boundary surface.
#[derive(Debug, Clone)]
pub struct ShapeData {
    /// Display name, used in messages.
    pub name: String,
    /// Closed boundary surface.
    pub surface: TriangleMesh,
    /// Named properties ("Mesh priority", ...).
    pub properties: Properties,
    /// Assigned material, if any.
    pub material: Option<MaterialId>,
}

impl ShapeData {
    /// Creates a shape with no properties.
    #[must_use]
    pub fn new(name: impl Into<String>, surface: TriangleMesh, material: Option<MaterialId>) -> Self {
        Self {
            name: name.into(),
            surface,
            properties: Properties::new(),
            material,
        }
    }

    /// Sets the "Mesh priority" property.
    #[must_use]
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.properties
            .set(MESH_PRIORITY, PropertyValue::Double(priority));
        self
    }

    /// The shape's mesh priority, 0 when the property is not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is present but not numeric.
    pub fn mesh_priority(&self) -> Result<f64, ConfigError> {
        Ok(self.properties.double(MESH_PRIORITY)?.unwrap_or(0.0))
    }
}
