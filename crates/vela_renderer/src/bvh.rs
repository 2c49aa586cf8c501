//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree is stored in two arenas, one for internal nodes and one for leaf
//! primitive lists, linked by tagged [`NodeRef`] indices. Both build and
//! traversal are recursive; depth is bounded by the leaf size and the stall
//! detection in the builder.

use std::time::Instant;

use rand::{Rng, RngCore};
use vela_math::{Aabb, Ray, Vec3};

use crate::bvh_config::{AxisSelection, AxisSplit, BvhBuildInfo, BvhResult};
use crate::primitive::{Intersection, Primitive, PrimitiveHandle};

/// Reference to a node in one of the two arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Internal(usize),
    Leaf(usize),
}

/// Internal node with two children.
#[derive(Debug, Clone)]
struct InternalNode {
    bbox: Aabb,
    left: NodeRef,
    right: NodeRef,
}

/// Leaf node: indices into [`Bvh::primitives`]. May be empty.
#[derive(Debug, Clone)]
struct LeafNode {
    bbox: Aabb,
    primitives: Vec<usize>,
}

/// A built BVH. Immutable once built and safe to share between threads.
pub struct Bvh {
    primitives: Vec<PrimitiveHandle>,
    internals: Vec<InternalNode>,
    leaves: Vec<LeafNode>,
    root: NodeRef,
}

/// Per-primitive data the builder needs over and over.
#[derive(Debug, Clone, Copy)]
struct BuildEntry {
    index: usize,
    bbox: Aabb,
    center: Vec3,
}

impl Bvh {
    /// A BVH over nothing: a single empty leaf that no ray hits.
    pub fn empty() -> Self {
        Self {
            primitives: Vec::new(),
            internals: Vec::new(),
            leaves: vec![LeafNode {
                bbox: Aabb::EMPTY,
                primitives: Vec::new(),
            }],
            root: NodeRef::Leaf(0),
        }
    }

    /// Build a BVH over `primitives`.
    ///
    /// `rng` drives the random axis/split policies; the build is otherwise
    /// deterministic and never touches a global generator.
    pub fn build(
        primitives: Vec<PrimitiveHandle>,
        info: &BvhBuildInfo,
        rng: &mut dyn RngCore,
    ) -> BvhResult<Self> {
        info.validate()?;

        log::info!("Building BVH (primitives: {})", primitives.len());
        let start = Instant::now();

        let entries: Vec<BuildEntry> = primitives
            .iter()
            .enumerate()
            .map(|(index, primitive)| {
                let bbox = primitive.bounding_box();
                BuildEntry {
                    index,
                    bbox,
                    center: bbox.center(),
                }
            })
            .collect();

        let mut builder = Builder {
            info,
            rng,
            internals: Vec::new(),
            leaves: Vec::new(),
        };

        let root = if entries.len() <= info.max_leaf_size {
            builder.make_leaf(entries)
        } else {
            builder.build_recursive(entries, (0, 0))
        };

        let Builder {
            internals, leaves, ..
        } = builder;

        log::info!(
            "BVH building finished (time: {} ms, nodes: {}, leafs: {})",
            start.elapsed().as_millis(),
            internals.len(),
            leaves.len()
        );

        Ok(Self {
            primitives,
            internals,
            leaves,
            root,
        })
    }

    pub fn root(&self) -> NodeRef {
        self.root
    }

    pub fn internal_node_count(&self) -> usize {
        self.internals.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn primitives(&self) -> &[PrimitiveHandle] {
        &self.primitives
    }

    /// Box of any node.
    pub fn node_bbox(&self, node: NodeRef) -> Aabb {
        match node {
            NodeRef::Internal(i) => self.internals[i].bbox,
            NodeRef::Leaf(i) => self.leaves[i].bbox,
        }
    }

    /// Children of an internal node, `None` for leaves.
    pub fn children(&self, node: NodeRef) -> Option<(NodeRef, NodeRef)> {
        match node {
            NodeRef::Internal(i) => Some((self.internals[i].left, self.internals[i].right)),
            NodeRef::Leaf(_) => None,
        }
    }

    /// Primitive indices held by a leaf, `None` for internal nodes.
    pub fn leaf_primitives(&self, node: NodeRef) -> Option<&[usize]> {
        match node {
            NodeRef::Internal(_) => None,
            NodeRef::Leaf(i) => Some(&self.leaves[i].primitives),
        }
    }

    fn intersect_node(&self, node: NodeRef, ray: &Ray, intersection: &mut Intersection) -> bool {
        match node {
            NodeRef::Internal(i) => {
                let node = &self.internals[i];
                if !node.bbox.intersects(ray) {
                    return false;
                }

                let mut found = false;

                if self.intersect_node(node.left, ray, intersection) {
                    if ray.fast_occlusion() {
                        return true;
                    }
                    found = true;
                }

                if self.intersect_node(node.right, ray, intersection) {
                    if ray.fast_occlusion() {
                        return true;
                    }
                    found = true;
                }

                found
            }

            NodeRef::Leaf(i) => {
                let leaf = &self.leaves[i];
                if leaf.primitives.is_empty() || !leaf.bbox.intersects(ray) {
                    return false;
                }

                let mut found = false;
                for &index in &leaf.primitives {
                    if self.primitives[index].intersect(ray, intersection) {
                        if ray.fast_occlusion() {
                            return true;
                        }
                        found = true;
                    }
                }
                found
            }
        }
    }
}

impl Primitive for Bvh {
    fn intersect(&self, ray: &Ray, intersection: &mut Intersection) -> bool {
        if ray.fast_occlusion() && intersection.was_found {
            return true;
        }

        self.intersect_node(self.root, ray, intersection)
    }

    fn bounding_box(&self) -> Aabb {
        self.node_bbox(self.root)
    }
}

struct Builder<'a> {
    info: &'a BvhBuildInfo,
    rng: &'a mut dyn RngCore,
    internals: Vec<InternalNode>,
    leaves: Vec<LeafNode>,
}

impl Builder<'_> {
    fn make_leaf(&mut self, entries: Vec<BuildEntry>) -> NodeRef {
        let bbox = union_box(&entries);
        self.leaves.push(LeafNode {
            bbox,
            primitives: entries.into_iter().map(|e| e.index).collect(),
        });
        NodeRef::Leaf(self.leaves.len() - 1)
    }

    /// Split `entries` into an internal node.
    ///
    /// `previous` is the (left, right) split of the parent. A side that did not
    /// shrink reproduces it exactly, in which case both sides become leaves.
    fn build_recursive(&mut self, entries: Vec<BuildEntry>, previous: (usize, usize)) -> NodeRef {
        let bbox = union_box(&entries);
        let (axis, split_point) = self.calculate_split(&entries, &bbox);

        let (left, right): (Vec<BuildEntry>, Vec<BuildEntry>) = entries
            .into_iter()
            .partition(|e| e.center[axis] <= split_point);

        let counts = (left.len(), right.len());
        let stalled = counts == previous;

        let left = if left.len() > self.info.max_leaf_size && !stalled {
            self.build_recursive(left, counts)
        } else {
            self.make_leaf(left)
        };

        let right = if right.len() > self.info.max_leaf_size && !stalled {
            self.build_recursive(right, counts)
        } else {
            self.make_leaf(right)
        };

        self.internals.push(InternalNode { bbox, left, right });
        NodeRef::Internal(self.internals.len() - 1)
    }

    fn calculate_split(&mut self, entries: &[BuildEntry], bbox: &Aabb) -> (usize, f32) {
        if self.info.use_sah {
            return sah_split(entries, bbox, self.info.regular_sah_splits);
        }

        let axis = match self.info.axis_selection {
            AxisSelection::Largest => bbox.largest_axis(),
            AxisSelection::Random => self.rng.gen_range(0..3),
        };

        let split_point = match self.info.axis_split {
            AxisSplit::Middle => bbox.center()[axis],
            AxisSplit::Median => median_center(entries, axis),
            AxisSplit::Random => {
                let (min, max) = (bbox.min[axis], bbox.max[axis]);
                min + (max - min) * self.rng.gen::<f32>()
            }
        };

        (axis, split_point)
    }
}

fn union_box(entries: &[BuildEntry]) -> Aabb {
    entries.iter().fold(Aabb::EMPTY, |mut acc, e| {
        acc.expand(&e.bbox);
        acc
    })
}

/// Median of the primitive box centers on `axis`.
fn median_center(entries: &[BuildEntry], axis: usize) -> f32 {
    let mut centers: Vec<f32> = entries.iter().map(|e| e.center[axis]).collect();
    if centers.is_empty() {
        return 0.0;
    }

    centers.sort_unstable_by(f32::total_cmp);
    let n = centers.len();

    if n % 2 == 0 {
        (centers[n / 2 - 1] + centers[n / 2]) / 2.0
    } else {
        centers[n / 2]
    }
}

/// Lowest-cost (axis, split point) among the SAH candidates.
///
/// Per axis the candidates are the node center, the median of the primitive
/// centers and the `regular_splits - 1` inner points of a regular subdivision
/// of the node extent. The first candidate wins ties.
fn sah_split(entries: &[BuildEntry], bbox: &Aabb, regular_splits: usize) -> (usize, f32) {
    let fallback_axis = bbox.largest_axis();
    let mut best = (fallback_axis, bbox.center()[fallback_axis]);
    let mut lowest_cost = f32::INFINITY;

    let mut consider = |axis: usize, split_point: f32| {
        let cost = sah_cost_of(entries.iter().map(|e| (&e.bbox, e.center)), axis, split_point, bbox);
        if cost < lowest_cost {
            lowest_cost = cost;
            best = (axis, split_point);
        }
    };

    for axis in 0..3 {
        consider(axis, bbox.center()[axis]);
        consider(axis, median_center(entries, axis));

        if regular_splits > 0 {
            let step = bbox.extent()[axis] / regular_splits as f32;
            for i in 1..regular_splits {
                consider(axis, bbox.min[axis] + step * i as f32);
            }
        }
    }

    best
}

/// Surface area heuristic cost of splitting `boxes` at `split_point` on `axis`.
///
/// Boxes whose center is `<= split_point` go left. The cost is the sum over
/// the non-empty sides of `(side area / parent area) * side count`. A parent
/// with zero area (all primitives degenerate to one point) weights every side
/// by 1.
pub fn sah_cost(boxes: &[Aabb], axis: usize, split_point: f32, parent: &Aabb) -> f32 {
    sah_cost_of(boxes.iter().map(|b| (b, b.center())), axis, split_point, parent)
}

fn sah_cost_of<'a>(
    boxes: impl Iterator<Item = (&'a Aabb, Vec3)>,
    axis: usize,
    split_point: f32,
    parent: &Aabb,
) -> f32 {
    let mut left_box = Aabb::EMPTY;
    let mut right_box = Aabb::EMPTY;
    let mut left_count = 0usize;
    let mut right_count = 0usize;

    for (bbox, center) in boxes {
        if center[axis] <= split_point {
            left_box.expand(bbox);
            left_count += 1;
        } else {
            right_box.expand(bbox);
            right_count += 1;
        }
    }

    let parent_area = parent.surface_area();
    let ratio = |side: &Aabb| {
        if parent_area > 0.0 {
            side.surface_area() / parent_area
        } else {
            1.0
        }
    };

    let mut cost = 0.0;
    if left_count > 0 {
        cost += ratio(&left_box) * left_count as f32;
    }
    if right_count > 0 {
        cost += ratio(&right_box) * right_count as f32;
    }
    cost
}
