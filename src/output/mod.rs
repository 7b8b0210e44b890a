//! The arena that receives finished meshes.

mod compressed;

pub use compressed::CompressedVector;

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::build::{Interfaces, MeshResult};
use crate::error::{EntityError, Result};
use crate::geometry::{Grid, GridStatistics};
use crate::meshing::{
    CellFill, ConformalFacet, MatrixSummary, MeshNode, OperatorKind, OperatorMatrices,
};
use crate::model::ShapeId;

slotmap::new_key_type! {
    /// Unique identifier for a committed mesh.
    pub struct MeshDataId;
}

slotmap::new_key_type! {
    /// Unique identifier for a boundary face group.
    pub struct BoundaryFaceId;
}

slotmap::new_key_type! {
    /// Unique identifier for a conformal node list.
    pub struct NodeListId;
}

slotmap::new_key_type! {
    /// Unique identifier for a stored operator vector.
    pub struct OperatorVectorId;
}

slotmap::new_key_type! {
    /// Unique identifier for a per-shape mesh item.
    pub struct MeshItemId;
}

/// A committed mesh and the IDs of everything it owns.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub grid: Grid,
    pub statistics: GridStatistics,
    pub fill: CellFill,
    /// Equal-priority shape pairs that overlapped.
    pub overlaps: Vec<(ShapeId, ShapeId)>,
    pub boundary_faces: Vec<BoundaryFaceId>,
    /// Present for conformal meshes.
    pub node_list: Option<NodeListId>,
    pub operators: Vec<OperatorVectorId>,
    pub items: Vec<MeshItemId>,
}

/// Face geometry of a boundary group.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceGeometry {
    /// Encoded signed lattice faces per axis.
    Lattice([Vec<i64>; 3]),
    /// Facets over the mesh's node list.
    Conformal(Vec<ConformalFacet>),
}

/// Boundary faces between two owners.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFaceData {
    pub parent: MeshDataId,
    pub from: Option<ShapeId>,
    pub to: Option<ShapeId>,
    pub geometry: FaceGeometry,
}

/// Node coordinates of a conformal mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeListData {
    pub parent: MeshDataId,
    pub nodes: Vec<MeshNode>,
}

/// One stored operator vector.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorVectorData {
    pub parent: MeshDataId,
    pub kind: OperatorKind,
    pub values: CompressedVector,
    pub summary: Option<MatrixSummary>,
}

/// A boundary face group seen from one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedFace {
    pub face: BoundaryFaceId,
    /// `true` when the shape is the group's `from` side.
    pub forward: bool,
}

/// The mesh-side view of one input shape.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshItemData {
    pub parent: MeshDataId,
    pub shape: ShapeId,
    pub name: String,
    pub faces: Vec<OrientedFace>,
}

/// Central arena that owns committed meshes and their parts.
///
/// Every part records its parent mesh; removing a mesh walks its child
/// lists and removes them too.
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: SlotMap<MeshDataId, MeshData>,
    boundary_faces: SlotMap<BoundaryFaceId, BoundaryFaceData>,
    node_lists: SlotMap<NodeListId, NodeListData>,
    operators: SlotMap<OperatorVectorId, OperatorVectorData>,
    items: SlotMap<MeshItemId, MeshItemData>,
}

impl MeshStore {
    /// Creates a new, empty mesh store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a finished mesh with all of its parts.
    ///
    /// Nothing stays behind if the commit fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the fill or an operator vector does not match the
    /// grid's cell count.
    pub fn commit(&mut self, result: MeshResult) -> Result<MeshDataId> {
        let MeshResult {
            grid,
            statistics,
            fill,
            overlaps,
            interfaces,
            operators,
            shapes,
            ..
        } = result;
        let cell_count = grid.cell_count();
        let id = self.meshes.insert(MeshData {
            grid,
            statistics,
            fill,
            overlaps: overlaps.iter().copied().collect(),
            boundary_faces: Vec::new(),
            node_list: None,
            operators: Vec::new(),
            items: Vec::new(),
        });

        if let Err(err) = self.commit_parts(id, cell_count, interfaces, &operators, &shapes) {
            warn!(%err, "rolling back mesh commit");
            self.remove_mesh_data(id)?;
            return Err(err);
        }
        debug!(?id, "committed mesh");
        Ok(id)
    }

    fn commit_parts(
        &mut self,
        id: MeshDataId,
        cell_count: usize,
        interfaces: Interfaces,
        operators: &OperatorMatrices,
        shapes: &[(ShapeId, String)],
    ) -> Result<()> {
        let fill_len = self.mesh_data(id)?.fill.len();
        if fill_len != cell_count {
            return Err(EntityError::Inconsistent(format!(
                "fill has {fill_len} cells, grid has {cell_count}"
            ))
            .into());
        }

        let mut faces = Vec::new();
        let mut owners = Vec::new();
        let mut node_list = None;
        match interfaces {
            Interfaces::Lattice(groups) => {
                for group in groups {
                    owners.push((group.from, group.to));
                    faces.push(self.boundary_faces.insert(BoundaryFaceData {
                        parent: id,
                        from: group.from,
                        to: group.to,
                        geometry: FaceGeometry::Lattice(group.faces),
                    }));
                }
            }
            Interfaces::Conformal(mesh) => {
                for group in mesh.groups {
                    owners.push((group.from, group.to));
                    faces.push(self.boundary_faces.insert(BoundaryFaceData {
                        parent: id,
                        from: group.from,
                        to: group.to,
                        geometry: FaceGeometry::Conformal(group.facets),
                    }));
                }
                node_list = Some(self.node_lists.insert(NodeListData {
                    parent: id,
                    nodes: mesh.nodes,
                }));
            }
        }
        self.mesh_data_mut(id)?.boundary_faces.clone_from(&faces);
        self.mesh_data_mut(id)?.node_list = node_list;

        let expected = 3 * cell_count;
        for (kind, values) in operators.iter() {
            if values.len() != expected {
                return Err(EntityError::Inconsistent(format!(
                    "operator {} has {} entries, expected {expected}",
                    kind.name(),
                    values.len()
                ))
                .into());
            }
            let vector = self.operators.insert(OperatorVectorData {
                parent: id,
                kind,
                values: CompressedVector::compress(values),
                summary: operators.summary(kind).copied(),
            });
            self.mesh_data_mut(id)?.operators.push(vector);
        }

        for (shape, name) in shapes {
            let oriented = owners
                .iter()
                .zip(&faces)
                .filter_map(|(&(from, to), &face)| {
                    if from == Some(*shape) {
                        Some(OrientedFace {
                            face,
                            forward: true,
                        })
                    } else if to == Some(*shape) {
                        Some(OrientedFace {
                            face,
                            forward: false,
                        })
                    } else {
                        None
                    }
                })
                .collect();
            let item = self.items.insert(MeshItemData {
                parent: id,
                shape: *shape,
                name: name.clone(),
                faces: oriented,
            });
            self.mesh_data_mut(id)?.items.push(item);
        }
        Ok(())
    }

    /// Removes a mesh and every part it owns.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh does not exist.
    pub fn remove_mesh_data(&mut self, id: MeshDataId) -> Result<()> {
        let data = self
            .meshes
            .remove(id)
            .ok_or_else(|| EntityError::NotFound(format!("mesh {id:?}")))?;
        for face in data.boundary_faces {
            self.boundary_faces.remove(face);
        }
        if let Some(list) = data.node_list {
            self.node_lists.remove(list);
        }
        for vector in data.operators {
            self.operators.remove(vector);
        }
        for item in data.items {
            self.items.remove(item);
        }
        Ok(())
    }

    // --- Mesh data ---

    /// Returns a reference to the mesh data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn mesh_data(&self, id: MeshDataId) -> Result<&MeshData> {
        self.meshes
            .get(id)
            .ok_or_else(|| EntityError::NotFound(format!("mesh {id:?}")).into())
    }

    fn mesh_data_mut(&mut self, id: MeshDataId) -> Result<&mut MeshData> {
        self.meshes
            .get_mut(id)
            .ok_or_else(|| EntityError::NotFound(format!("mesh {id:?}")).into())
    }

    /// Number of stored meshes.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// `true` if the store holds no entities at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
            && self.boundary_faces.is_empty()
            && self.node_lists.is_empty()
            && self.operators.is_empty()
            && self.items.is_empty()
    }

    // --- Parts ---

    /// Returns a reference to a boundary face group, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn boundary_face(&self, id: BoundaryFaceId) -> Result<&BoundaryFaceData> {
        self.boundary_faces
            .get(id)
            .ok_or_else(|| EntityError::NotFound(format!("boundary face {id:?}")).into())
    }

    /// Returns a reference to a node list, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn node_list(&self, id: NodeListId) -> Result<&NodeListData> {
        self.node_lists
            .get(id)
            .ok_or_else(|| EntityError::NotFound(format!("node list {id:?}")).into())
    }

    /// Returns a reference to an operator vector, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn operator_vector(&self, id: OperatorVectorId) -> Result<&OperatorVectorData> {
        self.operators
            .get(id)
            .ok_or_else(|| EntityError::NotFound(format!("operator vector {id:?}")).into())
    }

    /// Returns a reference to a mesh item, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn mesh_item(&self, id: MeshItemId) -> Result<&MeshItemData> {
        self.items
            .get(id)
            .ok_or_else(|| EntityError::NotFound(format!("mesh item {id:?}")).into())
    }

    /// Decompressed operator vector of a mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh or the vector cannot be found.
    pub fn operator_values(&self, mesh: MeshDataId, kind: OperatorKind) -> Result<Vec<f64>> {
        for &vector in &self.mesh_data(mesh)?.operators {
            let data = self.operator_vector(vector)?;
            if data.kind == kind {
                return Ok(data.values.decompress());
            }
        }
        Err(EntityError::NotFound(format!("operator {} of mesh {mesh:?}", kind.name())).into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CartmeshError;
    use crate::meshing::{extract_interfaces, ConformalMesh, OverlapSet};
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<ShapeId> {
        let mut map: SlotMap<ShapeId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn result(conformal: bool, vector_len: Option<usize>) -> (MeshResult, ShapeId) {
        let grid = Grid::new(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![0.0, 1.0, 2.0, 3.0],
            vec![0.0, 1.0, 2.0, 3.0],
        )
        .unwrap();
        let [shape] = ids(1)[..] else { unreachable!() };
        let mut fill = vec![None; grid.cell_count()];
        fill[grid.cell_index([1, 1, 1])] = Some(shape);
        let interfaces = if conformal {
            Interfaces::Conformal(ConformalMesh::extract(&grid, &fill))
        } else {
            Interfaces::Lattice(extract_interfaces(&grid, &fill))
        };
        let n = vector_len.unwrap_or(3 * grid.cell_count());
        let operators = OperatorMatrices::from_vectors(
            grid.cell_count(),
            std::array::from_fn(|_| vec![1.0; n]),
        );
        let result = MeshResult {
            statistics: grid.statistics(),
            fill,
            overlaps: OverlapSet::default(),
            fill_stats: Vec::new(),
            interfaces,
            projection: None,
            operators,
            shapes: vec![(shape, "cube".into())],
            grid,
        };
        (result, shape)
    }

    #[test]
    fn commit_stores_all_parts() {
        let mut store = MeshStore::new();
        let (result, shape) = result(false, None);
        let id = store.commit(result).unwrap();

        let mesh = store.mesh_data(id).unwrap();
        assert_eq!(mesh.boundary_faces.len(), 1);
        assert_eq!(mesh.operators.len(), 7);
        assert!(mesh.node_list.is_none());
        let item = store.mesh_item(mesh.items[0]).unwrap();
        assert_eq!(item.shape, shape);
        assert_eq!(item.faces.len(), 1);
        // The cube is the `to` side of background -> cube.
        assert!(!item.faces[0].forward);
        let face = store.boundary_face(item.faces[0].face).unwrap();
        assert_eq!(face.parent, id);
        let ds = store.operator_values(id, OperatorKind::Ds).unwrap();
        assert_eq!(ds.len(), 81);
        assert_eq!(
            store.operator_vector(mesh.operators[0]).unwrap().values.run_count(),
            1
        );
    }

    #[test]
    fn conformal_commit_keeps_nodes() {
        let mut store = MeshStore::new();
        let (result, _) = result(true, None);
        let id = store.commit(result).unwrap();
        let list = store.mesh_data(id).unwrap().node_list.unwrap();
        assert_eq!(store.node_list(list).unwrap().nodes.len(), 8);
    }

    #[test]
    fn remove_walks_children() {
        let mut store = MeshStore::new();
        let (result, _) = result(true, None);
        let id = store.commit(result).unwrap();
        let faces = store.mesh_data(id).unwrap().boundary_faces.clone();
        store.remove_mesh_data(id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.boundary_face(faces[0]).unwrap_err(),
            CartmeshError::Entity(EntityError::NotFound(_))
        ));
        assert!(store.remove_mesh_data(id).is_err());
    }

    #[test]
    fn failed_commit_rolls_back() {
        let mut store = MeshStore::new();
        let (good, _) = result(false, None);
        store.commit(good).unwrap();
        let (bad, _) = result(false, Some(5));
        let err = store.commit(bad).unwrap_err();
        assert!(matches!(
            err,
            CartmeshError::Entity(EntityError::Inconsistent(_))
        ));
        assert_eq!(store.mesh_count(), 1);
        assert_eq!(store.boundary_faces.len(), 1);
        assert_eq!(store.operators.len(), 7);
        assert_eq!(store.items.len(), 1);
    }
}
