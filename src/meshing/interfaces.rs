use std::collections::HashMap;

use crate::geometry::Grid;
use crate::math::transverse_axes;
use crate::model::ShapeId;

/// A grid face between two cells with different owners.
#[derive(Debug, Clone, Copy)]
pub(super) struct Interface {
    /// Axis the face is normal to.
    pub axis: usize,
    /// Lattice node at the face's lower corner.
    pub node: [usize; 3],
    /// Cell on the `-axis` side, `None` outside the grid.
    pub lower: Option<usize>,
    /// Cell on the `+axis` side, `None` outside the grid.
    pub upper: Option<usize>,
    pub from: Option<ShapeId>,
    pub to: Option<ShapeId>,
}

/// Visits every face whose two sides have different owners.
///
/// For each axis `w` the sweep runs over all face slices along `w`,
/// including the two boundary slices, whose outer side is background.
pub(super) fn for_each_interface(
    grid: &Grid,
    fill: &[Option<ShapeId>],
    mut visit: impl FnMut(&Interface),
) {
    let counts = grid.cell_counts();
    for w in 0..3 {
        let (u, v) = transverse_axes(w);
        for l in 0..=counts[w] {
            for iv in 0..counts[v] {
                for iu in 0..counts[u] {
                    let mut node = [0; 3];
                    node[w] = l;
                    node[u] = iu;
                    node[v] = iv;
                    let cell_at = |level: usize| {
                        let mut c = node;
                        c[w] = level;
                        grid.cell_index(c)
                    };
                    let lower = (l > 0).then(|| cell_at(l - 1));
                    let upper = (l < counts[w]).then(|| cell_at(l));
                    let from = lower.and_then(|c| fill[c]);
                    let to = upper.and_then(|c| fill[c]);
                    if from != to {
                        visit(&Interface {
                            axis: w,
                            node,
                            lower,
                            upper,
                            from,
                            to,
                        });
                    }
                }
            }
        }
    }
}

/// Maps ordered owner pairs to group slots, folding reversed pairs onto the
/// group seen first.
#[derive(Debug, Default)]
pub(super) struct PairIndex {
    groups: HashMap<(Option<ShapeId>, Option<ShapeId>), usize>,
}

impl PairIndex {
    /// Returns the group slot for `(from, to)` and whether the facet must be
    /// reversed to fit it. Unseen pairs get slot `next`.
    pub fn lookup(
        &mut self,
        from: Option<ShapeId>,
        to: Option<ShapeId>,
        next: usize,
    ) -> (usize, bool) {
        if let Some(&slot) = self.groups.get(&(from, to)) {
            return (slot, false);
        }
        if let Some(&slot) = self.groups.get(&(to, from)) {
            return (slot, true);
        }
        self.groups.insert((from, to), next);
        (next, false)
    }
}

/// A face reference: lattice node of the lower corner plus orientation.
///
/// Encoded as `±(node + 1)`; the sign is `+` when the face normal (the
/// positive axis direction) points from the group's `from` owner to its `to`
/// owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedFace {
    pub node: usize,
    pub positive: bool,
}

impl SignedFace {
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn encode(self) -> i64 {
        let magnitude = self.node as i64 + 1;
        if self.positive {
            magnitude
        } else {
            -magnitude
        }
    }

    /// Decodes an encoded face; `0` is not a valid face.
    #[must_use]
    pub fn decode(code: i64) -> Option<Self> {
        let node = usize::try_from(code.unsigned_abs().checked_sub(1)?).ok()?;
        Some(Self {
            node,
            positive: code > 0,
        })
    }
}

/// Boundary faces between one ordered pair of owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetGroup {
    /// Owner on the back side; `None` is background.
    pub from: Option<ShapeId>,
    /// Owner on the front side; `None` is background.
    pub to: Option<ShapeId>,
    /// Encoded [`SignedFace`]s normal to x, y and z.
    pub faces: [Vec<i64>; 3],
}

impl FacetGroup {
    fn new(from: Option<ShapeId>, to: Option<ShapeId>) -> Self {
        Self {
            from,
            to,
            faces: Default::default(),
        }
    }

    /// Total number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.iter().map(Vec::len).sum()
    }

    /// `true` if the group touches `shape` on either side.
    #[must_use]
    pub fn touches(&self, shape: ShapeId) -> bool {
        self.from == Some(shape) || self.to == Some(shape)
    }
}

/// Collects the boundary faces of a fill, one group per unordered owner
/// pair in first-seen order.
#[must_use]
pub fn extract_interfaces(grid: &Grid, fill: &[Option<ShapeId>]) -> Vec<FacetGroup> {
    let mut groups: Vec<FacetGroup> = Vec::new();
    let mut pairs = PairIndex::default();
    for_each_interface(grid, fill, |face| {
        let (slot, reversed) = pairs.lookup(face.from, face.to, groups.len());
        if slot == groups.len() {
            groups.push(FacetGroup::new(face.from, face.to));
        }
        let signed = SignedFace {
            node: grid.node_index(face.node),
            positive: !reversed,
        };
        groups[slot].faces[face.axis].push(signed.encode());
    });
    groups
}
