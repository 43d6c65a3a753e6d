use crate::{Bounds3f, Point3f, Ray, Vec3f, Error};
use crate::entity::{Entity, EntityId, Intersection};
use bumpalo::Bump;
use partition::partition;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use tracing::{debug, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMethod {
    /// Split at the midpoint of the centroid bounds along the widest axis
    Middle,
    /// Split into two halves with the same number of entities
    EqualCounts,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhOptions {
    /// Subsets with at most this many entities become leaves
    pub max_leaf_size: usize,
    pub split_method: SplitMethod,
}

impl Default for BvhOptions {
    fn default() -> Self {
        Self { max_leaf_size: 4, split_method: SplitMethod::Middle }
    }
}

impl BvhOptions {
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_leaf_size == 0 || self.max_leaf_size > 255 {
            return Err(Error::InvalidSettings(format!("max_leaf_size {} must be in 1..=255", self.max_leaf_size)));
        }
        Ok(())
    }
}

/// A bounding volume hierarchy over the scene's entities. Immutable once built.
pub struct Bvh {
    entities: Vec<Entity>,
    nodes: Vec<LinearBVHNode>,
    bounds: Bounds3f,
}

impl Bvh {
    /// Build the hierarchy. Each entity's id is set to its position in `entities`. Entities with
    /// non-finite bounds or without a positive finite area are skipped.
    #[tracing::instrument(skip(entities), fields(n_entities = entities.len()))]
    pub fn build(entities: Vec<Entity>, options: BvhOptions) -> Result<Bvh, Error> {
        options.validate()?;

        let mut kept = Vec::with_capacity(entities.len());
        for (i, mut entity) in entities.into_iter().enumerate() {
            entity.id = EntityId(i);
            let bounds = entity.world_bound();
            let area = entity.shape().area();
            if !bounds.is_finite() || bounds.is_empty() || !(area.is_finite() && area > 0.0) {
                warn!(entity = i, area, "skipping degenerate entity");
                continue;
            }
            kept.push(entity);
        }
        if kept.is_empty() {
            return Err(Error::EmptyAggregate);
        }

        let mut prim_info: Vec<BVHPrimInfo> = kept.iter().enumerate().map(|(i, e)| {
            BVHPrimInfo::new(i, e.world_bound())
        }).collect();

        let arena = Bump::new();
        let mut prim_ordering: Vec<isize> = Vec::with_capacity(kept.len());
        let mut total_nodes = 0;

        let root = Self::recursive_build(
            &arena,
            &mut prim_info,
            &mut prim_ordering,
            options,
            &mut total_nodes
        );

        apply_permutation(&mut kept, &mut prim_ordering);

        let mut nodes = Vec::with_capacity(total_nodes);
        Self::flatten(root, &mut nodes);
        debug!(nodes = nodes.len(), entities = kept.len(), "built BVH");

        Ok(Bvh { entities: kept, nodes, bounds: root.bounds() })
    }

    fn recursive_build<'a>(
        arena: &'a Bump,
        prim_info: &mut [BVHPrimInfo],
        prim_ordering: &mut Vec<isize>,
        options: BvhOptions,
        total_nodes: &mut usize,
    ) -> &'a BVHBuildNode<'a> {
        *total_nodes += 1;

        // Find the union of the bounding boxes of all primitives in this node,
        // and the bounding box of all centroids
        let (node_bounds, centroid_bounds) = prim_info.iter()
            .fold((Bounds3f::empty(), Bounds3f::empty()), |(node_bb, centr_bb), prim| {
                (node_bb.join(&prim.bounds), centr_bb.join_point(&prim.centroid))
            });

        let n_prims = prim_info.len();
        let ax = centroid_bounds.maximum_extent();

        // If there are few enough primitives or all the centroids lie on the same point
        // (and therefore can't be partitioned), create a leaf node.
        if n_prims <= options.max_leaf_size || centroid_bounds.max[ax] == centroid_bounds.min[ax] {
            let first_prim_idx = prim_ordering.len();
            for prim in prim_info.iter() {
                prim_ordering.push(prim.prim_id as isize)
            }
            return arena.alloc(BVHBuildNode::new_leaf(first_prim_idx, n_prims, node_bounds));
        }

        let mut mid = 0;
        if options.split_method == SplitMethod::Middle {
            let midpoint = (centroid_bounds.min[ax] + centroid_bounds.max[ax]) / 2.0;
            let (part1, _) = partition(prim_info, |prim| {
                prim.centroid[ax] < midpoint
            });
            mid = part1.len();
        }

        // equal counts, or a middle split that left one side empty
        if mid == 0 || mid == n_prims {
            mid = n_prims / 2;
            prim_info.select_nth_unstable_by(mid, |a, b| {
                a.centroid[ax].partial_cmp(&b.centroid[ax]).unwrap_or(Ordering::Equal)
            });
        }

        let (part1, part2) = prim_info.split_at_mut(mid);
        let child1 = Self::recursive_build(arena, part1, prim_ordering, options, total_nodes);
        let child2 = Self::recursive_build(arena, part2, prim_ordering, options, total_nodes);

        arena.alloc(BVHBuildNode::new_interior([child1, child2], ax))
    }

    /// Lay the tree out depth first. The first child of an interior node directly follows it.
    fn flatten(node: &BVHBuildNode, nodes: &mut Vec<LinearBVHNode>) -> usize {
        let offset = nodes.len();
        match *node {
            BVHBuildNode::Leaf { bounds, first_prim_idx, n_prims } => {
                nodes.push(LinearBVHNode::Leaf {
                    bounds,
                    primitives_offset: first_prim_idx as u32,
                    n_primitives: n_prims as u32,
                });
            }
            BVHBuildNode::Interior { bounds, children, split_axis } => {
                nodes.push(LinearBVHNode::Interior {
                    bounds,
                    second_child_offset: 0,
                    split_axis: split_axis as u8,
                });
                Self::flatten(children[0], nodes);
                let second = Self::flatten(children[1], nodes);
                if let LinearBVHNode::Interior { second_child_offset, .. } = &mut nodes[offset] {
                    *second_child_offset = second as u32;
                }
            }
        }
        offset
    }

    pub fn bounds(&self) -> Bounds3f {
        self.bounds
    }

    /// The entities in traversal order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub(crate) fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Find the closest intersection along the ray. When two entities report the same distance
    /// the one visited first is kept.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection<'_>> {
        let mut ray = *ray;
        let inv_dir = vec3f!(1.0 / ray.dir.x, 1.0 / ray.dir.y, 1.0 / ray.dir.z);
        let dir_is_neg = [inv_dir.x < 0.0, inv_dir.y < 0.0, inv_dir.z < 0.0];

        let mut closest: Option<Intersection<'_>> = None;
        let mut to_visit: SmallVec<[usize; 64]> = SmallVec::new();
        let mut current = 0;

        loop {
            match &self.nodes[current] {
                LinearBVHNode::Leaf { bounds, primitives_offset, n_primitives } => {
                    if bounds.intersect_p(&ray, inv_dir, dir_is_neg) {
                        let start = *primitives_offset as usize;
                        for entity in &self.entities[start..start + *n_primitives as usize] {
                            if let Some(isect) = entity.intersect(&ray) {
                                if closest.as_ref().map_or(true, |c| isect.t < c.t) {
                                    ray.t_max = isect.t;
                                    closest = Some(isect);
                                }
                            }
                        }
                    }
                }
                LinearBVHNode::Interior { bounds, second_child_offset, split_axis } => {
                    if bounds.intersect_p(&ray, inv_dir, dir_is_neg) {
                        // visit the near child first
                        if dir_is_neg[*split_axis as usize] {
                            to_visit.push(current + 1);
                            current = *second_child_offset as usize;
                        } else {
                            to_visit.push(*second_child_offset as usize);
                            current += 1;
                        }
                        continue;
                    }
                }
            }

            match to_visit.pop() {
                Some(next) => current = next,
                None => break,
            }
        }

        closest
    }

    /// Whether any entity is hit within the ray's range.
    pub fn intersect_test(&self, ray: &Ray) -> bool {
        let inv_dir = vec3f!(1.0 / ray.dir.x, 1.0 / ray.dir.y, 1.0 / ray.dir.z);
        let dir_is_neg = [inv_dir.x < 0.0, inv_dir.y < 0.0, inv_dir.z < 0.0];

        let mut to_visit: SmallVec<[usize; 64]> = SmallVec::new();
        let mut current = 0;

        loop {
            match &self.nodes[current] {
                LinearBVHNode::Leaf { bounds, primitives_offset, n_primitives } => {
                    if bounds.intersect_p(ray, inv_dir, dir_is_neg) {
                        let start = *primitives_offset as usize;
                        let leaf = &self.entities[start..start + *n_primitives as usize];
                        if leaf.iter().any(|e| e.intersect_test(ray)) {
                            return true;
                        }
                    }
                }
                LinearBVHNode::Interior { bounds, second_child_offset, split_axis } => {
                    if bounds.intersect_p(ray, inv_dir, dir_is_neg) {
                        if dir_is_neg[*split_axis as usize] {
                            to_visit.push(current + 1);
                            current = *second_child_offset as usize;
                        } else {
                            to_visit.push(*second_child_offset as usize);
                            current += 1;
                        }
                        continue;
                    }
                }
            }

            match to_visit.pop() {
                Some(next) => current = next,
                None => return false,
            }
        }
    }
}

#[derive(Debug)]
pub enum LinearBVHNode {
    Leaf {
        bounds: Bounds3f,
        primitives_offset: u32,
        n_primitives: u32
    },
    Interior {
        bounds: Bounds3f,
        second_child_offset: u32,
        split_axis: u8
    }
}

struct BVHPrimInfo {
    prim_id: usize,
    bounds: Bounds3f,
    centroid: Point3f
}

impl BVHPrimInfo {
    fn new(prim_id: usize, bounds: Bounds3f) -> Self {
        Self { prim_id, bounds, centroid: bounds.centroid() }
    }
}

enum BVHBuildNode<'a> {
    Leaf {
        bounds: Bounds3f,
        first_prim_idx: usize,
        n_prims: usize,
    },

    Interior {
        bounds: Bounds3f,
        children: [&'a BVHBuildNode<'a>; 2],
        split_axis: usize
    }
}

impl<'a> BVHBuildNode<'a> {
    fn new_leaf(first_prim_idx: usize, n_prims: usize, bounds: Bounds3f) -> Self {
        BVHBuildNode::Leaf {
            first_prim_idx, n_prims, bounds
        }
    }

    fn new_interior(children: [&'a BVHBuildNode<'a>; 2], split_axis: usize) -> Self {
        let bounds = children[0].bounds().join(&children[1].bounds());
        BVHBuildNode::Interior {
            children,
            bounds,
            split_axis
        }
    }

    fn bounds(&self) -> Bounds3f {
        match self {
            BVHBuildNode::Leaf {bounds, ..} => *bounds,
            BVHBuildNode::Interior {bounds, ..} => *bounds
        }
    }
}

/// Reorder `items` in place so that `items[i]` becomes the element previously at `indices[i]`.
/// `indices` is used as scratch space.
fn apply_permutation<T>(items: &mut [T], indices: &mut [isize]) {
    assert_eq!(items.len(), indices.len());

    for i in 0..items.len() {
        if indices[i] < 0 { continue; }

        let mut pos = i;

        while indices[pos] != i as isize {
            let target = indices[pos] as usize;
            items.swap(pos, target);
            indices[pos] = -1 - indices[pos];

            pos = target;
        }

        indices[pos] = -1 - indices[pos];
    }
}

#[allow(dead_code)]
fn _assert_sync() {
    fn is_sync<T: Sync + Send>() {}
    is_sync::<Bvh>();
}
