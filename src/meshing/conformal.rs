use std::collections::HashMap;

use tracing::debug;

use crate::geometry::{Grid, TriangleMesh};
use crate::math::{
    axis_vector, closest_point_on_triangle, ray_triangle_intersect, transverse_axes, Point3,
    TOLERANCE,
};
use crate::model::ShapeId;

use super::interfaces::{for_each_interface, PairIndex};
use super::CellTriangleIndex;

/// A boundary facet whose corners may have moved off the lattice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformalFacet {
    /// Compact node indices; four for a quad, three once collapsed.
    pub nodes: Vec<usize>,
    /// Cell on the group's `from` side, `None` outside the grid.
    pub back_cell: Option<usize>,
    /// Cell on the group's `to` side, `None` outside the grid.
    pub front_cell: Option<usize>,
}

/// Conformal facets between one ordered pair of owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformalGroup {
    pub from: Option<ShapeId>,
    pub to: Option<ShapeId>,
    pub facets: Vec<ConformalFacet>,
}

impl ConformalGroup {
    /// `true` if the group touches `shape` on either side.
    #[must_use]
    pub fn touches(&self, shape: ShapeId) -> bool {
        self.from == Some(shape) || self.to == Some(shape)
    }
}

/// Position of a facet inside a [`ConformalMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FacetRef {
    pub group: usize,
    pub facet: usize,
}

/// A facet corner.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    /// Lattice coordinates the node started from.
    pub lattice: [usize; 3],
    /// Current position.
    pub position: Point3,
    /// Surface hit distances along the adjacent grid edges, in
    /// `-x, +x, -y, +y, -z, +z` order.
    pub intersections: [Option<f64>; 6],
    /// Fixed nodes are not moved by later projections.
    pub fixed: bool,
    /// Facets this node is a corner of.
    pub facets: Vec<FacetRef>,
}

/// Counters from a projection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionStats {
    /// Nodes moved onto a surface.
    pub projected: usize,
    /// Nodes with no candidate triangle nearby.
    pub unmoved: usize,
    /// Quads collapsed to triangles.
    pub collapsed: usize,
}

/// Boundary facets over a compact node list.
#[derive(Debug, Clone, PartialEq)]
pub struct ConformalMesh {
    pub groups: Vec<ConformalGroup>,
    pub nodes: Vec<MeshNode>,
}

impl ConformalMesh {
    /// Collects the boundary quads of a fill and compacts their nodes.
    ///
    /// Quads are wound counterclockwise around the axis they are normal to,
    /// so their normal points from `from` to `to`. Nodes are numbered in
    /// order of first reference.
    #[must_use]
    pub fn extract(grid: &Grid, fill: &[Option<ShapeId>]) -> Self {
        let mut groups: Vec<ConformalGroup> = Vec::new();
        let mut pairs = PairIndex::default();
        for_each_interface(grid, fill, |face| {
            let (slot, reversed) = pairs.lookup(face.from, face.to, groups.len());
            if slot == groups.len() {
                groups.push(ConformalGroup {
                    from: face.from,
                    to: face.to,
                    facets: Vec::new(),
                });
            }
            let (u, v) = transverse_axes(face.axis);
            let corner = |du: usize, dv: usize| {
                let mut n = face.node;
                n[u] += du;
                n[v] += dv;
                grid.node_index(n)
            };
            let mut nodes = vec![corner(0, 0), corner(1, 0), corner(1, 1), corner(0, 1)];
            let (mut back_cell, mut front_cell) = (face.lower, face.upper);
            if reversed {
                nodes.reverse();
                std::mem::swap(&mut back_cell, &mut front_cell);
            }
            groups[slot].facets.push(ConformalFacet {
                nodes,
                back_cell,
                front_cell,
            });
        });

        let mut compact: HashMap<usize, usize> = HashMap::new();
        let mut nodes: Vec<MeshNode> = Vec::new();
        for (g, group) in groups.iter_mut().enumerate() {
            for (f, facet) in group.facets.iter_mut().enumerate() {
                for raw in &mut facet.nodes {
                    let index = *compact.entry(*raw).or_insert_with(|| {
                        let lattice = grid.node_coords(*raw);
                        nodes.push(MeshNode {
                            lattice,
                            position: grid.node_position(lattice),
                            intersections: [None; 6],
                            fixed: false,
                            facets: Vec::new(),
                        });
                        nodes.len() - 1
                    });
                    nodes[index].facets.push(FacetRef { group: g, facet: f });
                    *raw = index;
                }
            }
        }
        debug!(
            groups = groups.len(),
            nodes = nodes.len(),
            lattice_nodes = grid.node_count(),
            "compacted conformal nodes"
        );
        Self { groups, nodes }
    }

    /// Total number of facets.
    #[must_use]
    pub fn facet_count(&self) -> usize {
        self.groups.iter().map(|g| g.facets.len()).sum()
    }

    /// Moves boundary nodes onto the shape surfaces.
    ///
    /// `shapes` lists `(id, surface, priority)`; higher priorities project
    /// first and ties keep their order. A node only sees triangles recorded
    /// for cells around it that its shape owns. When `lock` is set, a
    /// projected node is fixed and later shapes leave it alone.
    pub fn project(
        &mut self,
        grid: &Grid,
        fill: &[Option<ShapeId>],
        shapes: &[(ShapeId, &TriangleMesh, f64)],
        triangles: &CellTriangleIndex,
        lock: bool,
    ) -> ProjectionStats {
        let mut order: Vec<&(ShapeId, &TriangleMesh, f64)> = shapes.iter().collect();
        order.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut stats = ProjectionStats::default();
        let mut seen = vec![false; self.nodes.len()];
        for &&(shape, surface, _) in &order {
            seen.fill(false);
            let touching: Vec<usize> = self
                .groups
                .iter()
                .filter(|g| g.touches(shape))
                .flat_map(|g| g.facets.iter().flat_map(|f| f.nodes.iter().copied()))
                .collect();
            for node in touching {
                if std::mem::replace(&mut seen[node], true) || self.nodes[node].fixed {
                    continue;
                }
                if project_node(&mut self.nodes[node], grid, fill, shape, surface, triangles) {
                    stats.projected += 1;
                    self.nodes[node].fixed = lock;
                } else {
                    stats.unmoved += 1;
                }
            }
        }
        stats.collapsed = self.collapse_degenerate();
        debug!(
            projected = stats.projected,
            unmoved = stats.unmoved,
            collapsed = stats.collapsed,
            "projected conformal nodes"
        );
        stats
    }

    /// Drops repeated consecutive corners of quads, keeping facets with at
    /// least three distinct corners.
    fn collapse_degenerate(&mut self) -> usize {
        let mut collapsed = 0;
        for (g, group) in self.groups.iter_mut().enumerate() {
            for (f, facet) in group.facets.iter_mut().enumerate() {
                let n = facet.nodes.len();
                let mut kept: Vec<usize> = Vec::with_capacity(n);
                for i in 0..n {
                    let current = facet.nodes[i];
                    let next = facet.nodes[(i + 1) % n];
                    let a = &self.nodes[current].position;
                    let b = &self.nodes[next].position;
                    if (a - b).norm() > TOLERANCE {
                        kept.push(current);
                    }
                }
                if kept.len() < 3 || kept.len() == n {
                    continue;
                }
                let here = FacetRef { group: g, facet: f };
                for dropped in facet.nodes.iter().filter(|n| !kept.contains(n)) {
                    self.nodes[*dropped].facets.retain(|r| *r != here);
                }
                facet.nodes = kept;
                collapsed += 1;
            }
        }
        collapsed
    }
}

/// Cells within one step of a lattice node along every axis.
fn cells_around(grid: &Grid, lattice: [usize; 3]) -> impl Iterator<Item = usize> + '_ {
    let counts = grid.cell_counts();
    let span = |a: usize| lattice[a].saturating_sub(1)..=(lattice[a] + 1).min(counts[a] - 1);
    let (xs, ys, zs) = (span(0), span(1), span(2));
    zs.flat_map(move |k| {
        let xs = xs.clone();
        ys.clone()
            .flat_map(move |j| xs.clone().map(move |i| grid.cell_index([i, j, k])))
    })
}

/// Projects one node onto the nearest candidate triangle of `shape`.
///
/// Returns `false` when no triangle was found.
fn project_node(
    node: &mut MeshNode,
    grid: &Grid,
    fill: &[Option<ShapeId>],
    shape: ShapeId,
    surface: &TriangleMesh,
    triangles: &CellTriangleIndex,
) -> bool {
    let origin = grid.node_position(node.lattice);
    let mut candidates: Vec<usize> = cells_around(grid, node.lattice)
        .filter(|&c| fill[c] == Some(shape))
        .flat_map(|c| triangles.get(c, shape).iter().copied())
        .collect();
    candidates.sort_unstable();
    candidates.dedup();

    let nearest = candidates
        .iter()
        .map(|&t| closest_point_on_triangle(&surface.triangle(t), &origin))
        .min_by(|a, b| {
            (a - origin)
                .norm_squared()
                .total_cmp(&(b - origin).norm_squared())
        });
    let Some(position) = nearest else {
        return false;
    };
    node.position = position;

    for dir in 0..6 {
        let axis = dir / 2;
        let (sign, step) = if dir % 2 == 0 {
            (-1.0, grid.step_or_zero(axis, signed(node.lattice[axis]) - 1))
        } else {
            (1.0, grid.step_or_zero(axis, signed(node.lattice[axis])))
        };
        let direction = axis_vector(axis) * sign;
        node.intersections[dir] = candidates
            .iter()
            .filter_map(|&t| ray_triangle_intersect(&origin, &direction, &surface.triangle(t)))
            .filter(|&t| (0.0..=step).contains(&t))
            .min_by(f64::total_cmp);
    }
    true
}

#[allow(clippy::cast_possible_wrap)]
fn signed(i: usize) -> isize {
    i as isize
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Tolerances;
    use crate::math::Point3;
    use crate::meshing::VolumeFill;
    use crate::model::{MaterialData, ModelStore, ShapeData};
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    fn unit_grid(n: usize) -> Grid {
        #[allow(clippy::cast_precision_loss)]
        let lines: Vec<f64> = (0..=n).map(|i| i as f64).collect();
        Grid::new(lines.clone(), lines.clone(), lines).unwrap()
    }

    fn filled(
        grid: &Grid,
        surface: TriangleMesh,
    ) -> (ModelStore, ShapeId, crate::meshing::FillResult) {
        let mut model = ModelStore::new();
        let vacuum = model.add_material(MaterialData::vacuum());
        let id = model.add_shape(ShapeData::new("shape", surface, Some(vacuum)));
        let mut fill = VolumeFill::new(grid, Tolerances::default()).with_triangle_tracking();
        fill.add_shape(id, model.shape(id).unwrap()).unwrap();
        (model, id, fill.finish())
    }

    #[test]
    fn compaction_references_only_used_nodes() {
        let grid = unit_grid(5);
        let surface =
            TriangleMesh::axis_aligned_box(Point3::new(1.4, 1.4, 1.4), Point3::new(3.6, 3.6, 3.6));
        let (_, _, result) = filled(&grid, surface);
        let mesh = ConformalMesh::extract(&grid, &result.fill);

        assert_eq!(mesh.groups.len(), 1);
        // A 3x3x3 block: 6 sides of 9 quads, 4^3 - 2^3 corner nodes.
        assert_eq!(mesh.facet_count(), 54);
        assert_eq!(mesh.nodes.len(), 56);

        let mut referenced = HashSet::new();
        for facet in &mesh.groups[0].facets {
            for &n in &facet.nodes {
                assert!(n < mesh.nodes.len());
                referenced.insert(n);
            }
        }
        assert_eq!(referenced.len(), mesh.nodes.len());
        // First-reference order: the first facet holds nodes 0..4.
        assert_eq!(mesh.groups[0].facets[0].nodes, vec![0, 1, 2, 3]);
        for (i, node) in mesh.nodes.iter().enumerate() {
            assert!(!node.facets.is_empty());
            for r in &node.facets {
                assert!(mesh.groups[r.group].facets[r.facet].nodes.contains(&i));
            }
        }
    }

    #[test]
    fn quads_face_from_background_to_shape() {
        let grid = unit_grid(3);
        let surface =
            TriangleMesh::axis_aligned_box(Point3::new(1.2, 1.2, 1.2), Point3::new(1.8, 1.8, 1.8));
        let (_, id, result) = filled(&grid, surface);
        let mesh = ConformalMesh::extract(&grid, &result.fill);
        let group = &mesh.groups[0];
        assert_eq!(group.to, Some(id));
        let inside = grid.cell_center([1, 1, 1]);
        for facet in &group.facets {
            let p: Vec<Point3> = facet.nodes.iter().map(|&n| mesh.nodes[n].position).collect();
            let normal = (p[1] - p[0]).cross(&(p[2] - p[0]));
            let centroid = Point3::from((p[0].coords + p[2].coords) * 0.5);
            assert!(normal.dot(&(inside - centroid)) > 0.0);
            assert_eq!(facet.front_cell, Some(grid.cell_index([1, 1, 1])));
        }
    }

    #[test]
    fn projection_moves_nodes_onto_surface() {
        let grid = unit_grid(6);
        let (lo, hi) = (1.3, 4.6);
        let surface =
            TriangleMesh::axis_aligned_box(Point3::new(lo, lo, lo), Point3::new(hi, hi, hi));
        let (model, id, result) = filled(&grid, surface);
        let mut mesh = ConformalMesh::extract(&grid, &result.fill);
        let surface = &model.shape(id).unwrap().surface;
        let stats = mesh.project(
            &grid,
            &result.fill,
            &[(id, surface, 0.0)],
            result.triangles.as_ref().unwrap(),
            false,
        );

        assert_eq!(stats.projected + stats.unmoved, mesh.nodes.len());
        assert!(stats.projected > 0);
        for node in &mesh.nodes {
            let p = node.position;
            let on_face = (0..3).any(|a| (p[a] - lo).abs() < 1e-9 || (p[a] - hi).abs() < 1e-9);
            assert!(on_face, "{p:?} is not on the box");
            assert!(!node.fixed);
        }

        let corner = mesh.nodes.iter().find(|n| n.lattice == [1, 1, 1]).unwrap();
        assert_relative_eq!(corner.position, Point3::new(lo, lo, lo), epsilon = 1e-9);

        // The +x edge of node (1, 2, 2) crosses the face x = 1.3 after 0.3.
        let side = mesh.nodes.iter().find(|n| n.lattice == [1, 2, 2]).unwrap();
        assert_relative_eq!(side.position, Point3::new(lo, 2.0, 2.0), epsilon = 1e-9);
        assert_relative_eq!(side.intersections[1].unwrap(), 0.3, epsilon = 1e-9);
        assert!(side.intersections[0].is_none());
    }

    #[test]
    fn lock_fixes_projected_nodes() {
        let grid = unit_grid(6);
        let surface =
            TriangleMesh::axis_aligned_box(Point3::new(1.3, 1.3, 1.3), Point3::new(4.6, 4.6, 4.6));
        let (model, id, result) = filled(&grid, surface);
        let mut mesh = ConformalMesh::extract(&grid, &result.fill);
        let surface = &model.shape(id).unwrap().surface;
        let stats = mesh.project(
            &grid,
            &result.fill,
            &[(id, surface, 0.0)],
            result.triangles.as_ref().unwrap(),
            true,
        );
        assert_eq!(
            mesh.nodes.iter().filter(|n| n.fixed).count(),
            stats.projected
        );
    }

    #[test]
    fn coincident_corners_collapse_to_triangle() {
        let grid = unit_grid(3);
        let [id] = {
            let mut map: slotmap::SlotMap<ShapeId, ()> = slotmap::SlotMap::with_key();
            [map.insert(())]
        };
        let mut fill = vec![None; grid.cell_count()];
        fill[grid.cell_index([1, 1, 1])] = Some(id);
        let mut mesh = ConformalMesh::extract(&grid, &fill);
        let facet = mesh.groups[0].facets[0].clone();
        let moved = mesh.nodes[facet.nodes[1]].position;
        mesh.nodes[facet.nodes[0]].position = moved;

        let collapsed = mesh.collapse_degenerate();
        let facet_after = &mesh.groups[0].facets[0];
        assert!(collapsed >= 1);
        assert_eq!(facet_after.nodes.len(), 3);
        assert!(!facet_after.nodes.contains(&facet.nodes[0]));
        assert!(!mesh.nodes[facet.nodes[0]]
            .facets
            .contains(&FacetRef { group: 0, facet: 0 }));
    }
}
