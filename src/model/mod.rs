//! The entity model the mesher reads from: shapes and materials.

mod material;
mod properties;
mod shape;

pub use material::{MaterialData, MaterialId};
pub use properties::{Properties, PropertyValue};
pub use shape::{ShapeData, ShapeId, MESH_PRIORITY};

use std::collections::HashMap;

use crate::error::{ConfigError, EntityError, Result};
use slotmap::SlotMap;

/// Central arena that owns the shapes and materials of a model.
///
/// Shapes reference materials via typed IDs (generational indices).
#[derive(Debug, Default)]
pub struct ModelStore {
    shapes: SlotMap<ShapeId, ShapeData>,
    materials: SlotMap<MaterialId, MaterialData>,
}

impl ModelStore {
    /// Creates a new, empty model store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a shape and returns its ID.
    pub fn add_shape(&mut self, data: ShapeData) -> ShapeId {
        self.shapes.insert(data)
    }

    /// Removes a shape, returning its data.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<ShapeData> {
        self.shapes.remove(id)
    }

    /// Returns a reference to the shape data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn shape(&self, id: ShapeId) -> Result<&ShapeData> {
        self.shapes
            .get(id)
            .ok_or_else(|| EntityError::NotFound(format!("shape {id:?}")).into())
    }

    /// Iterates over all shapes in insertion order of their slots.
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeId, &ShapeData)> {
        self.shapes.iter()
    }

    /// Inserts a material and returns its ID.
    pub fn add_material(&mut self, data: MaterialData) -> MaterialId {
        self.materials.insert(data)
    }

    /// Returns a reference to the material data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn material(&self, id: MaterialId) -> Result<&MaterialData> {
        self.materials
            .get(id)
            .ok_or_else(|| EntityError::NotFound(format!("material {id:?}")).into())
    }

    /// Resolves the material of every listed shape into a side table.
    ///
    /// # Errors
    ///
    /// Returns an error if a shape cannot be read, has no material, or
    /// references a material that does not exist.
    pub fn material_table(&self, shapes: &[ShapeId]) -> Result<MaterialTable> {
        let mut table = MaterialTable::default();
        for &id in shapes {
            let shape = self.shape(id)?;
            let material_id = shape.material.ok_or_else(|| ConfigError::MissingMaterial {
                shape: shape.name.clone(),
            })?;
            let material = self.materials.get(material_id).ok_or_else(|| {
                ConfigError::MissingMaterial {
                    shape: shape.name.clone(),
                }
            })?;
            table.insert(id, material.clone());
        }
        Ok(table)
    }
}

/// Per-shape material records resolved for one build.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    materials: HashMap<ShapeId, MaterialData>,
}

impl MaterialTable {
    /// Associates a material with a shape.
    pub fn insert(&mut self, shape: ShapeId, material: MaterialData) {
        self.materials.insert(shape, material);
    }

    /// Material of a shape.
    #[must_use]
    pub fn get(&self, shape: ShapeId) -> Option<&MaterialData> {
        self.materials.get(&shape)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CartmeshError;
    use crate::geometry::TriangleMesh;
    use crate::math::Point3;

    fn cube() -> TriangleMesh {
        TriangleMesh::axis_aligned_box(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn material_table_resolves_materials() {
        let mut store = ModelStore::new();
        let pec = store.add_material(MaterialData::pec());
        let id = store.add_shape(ShapeData::new("cube", cube(), Some(pec)));
        let table = store.material_table(&[id]).unwrap();
        assert!(table.get(id).unwrap().is_pec);
    }

    #[test]
    fn shape_without_material_is_config_error() {
        let mut store = ModelStore::new();
        let id = store.add_shape(ShapeData::new("bare", cube(), None));
        let err = store.material_table(&[id]).unwrap_err();
        assert!(matches!(
            err,
            CartmeshError::Config(ConfigError::MissingMaterial { ref shape }) if shape == "bare"
        ));
    }

    #[test]
    fn removed_shape_is_not_found() {
        let mut store = ModelStore::new();
        let vacuum = store.add_material(MaterialData::vacuum());
        let id = store.add_shape(ShapeData::new("gone", cube(), Some(vacuum)));
        store.remove_shape(id);
        assert!(matches!(
            store.shape(id).unwrap_err(),
            CartmeshError::Entity(EntityError::NotFound(_))
        ));
    }

    #[test]
    fn priority_defaults_to_zero() {
        let shape = ShapeData::new("s", cube(), None);
        assert!(shape.mesh_priority().unwrap().abs() < f64::EPSILON);
        let shape = shape.with_priority(4.0);
        assert!((shape.mesh_priority().unwrap() - 4.0).abs() < f64::EPSILON);
    }
}
