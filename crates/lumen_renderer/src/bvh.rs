//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree is built over a permutation of indices into the world's primitive
//! array; primitives themselves are never moved. Each leaf holds exactly one
//! primitive. Nodes are split at the spatial median of the longest axis of
//! their bounding box.

use std::ops::Range;

use lumen_math::{axis, BoundingBox, Ray, Vec3, EPSILON};

use crate::{HitRecord, Primitive, PrimitiveId};

/// Where the split plane is placed along the chosen axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitPlacement {
    /// At the center of the node's bounding box.
    #[default]
    Center,
    /// At half the node's extent, measured from the origin of the axis.
    ///
    /// Only matches the box center for boxes starting at zero; kept for
    /// reproducing renders made with that convention.
    Verbatim,
}

impl SplitPlacement {
    fn split_value(self, bbox: &BoundingBox, dim: usize) -> f32 {
        match self {
            SplitPlacement::Center => axis(bbox.center(), dim),
            SplitPlacement::Verbatim => axis(bbox.extent(), dim) / 2.0,
        }
    }
}

/// BVH node - either a branch with two children or a leaf with one primitive.
#[derive(Debug)]
pub enum BvhNode {
    /// Leaf covering a single slot of the permutation.
    Leaf {
        bbox: BoundingBox,
        /// Index into the primitive array
        index: usize,
    },
    /// Internal node with two non-empty children.
    Branch {
        bbox: BoundingBox,
        /// Slots of the permutation covered by this subtree
        range: Range<usize>,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    fn node_count(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.node_count() + right.node_count(),
        }
    }

    fn depth(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn collect_leaves(&self, out: &mut Vec<usize>) {
        match self {
            BvhNode::Leaf { index, .. } => out.push(*index),
            BvhNode::Branch { left, right, .. } => {
                left.collect_leaves(out);
                right.collect_leaves(out);
            }
        }
    }
}

/// Per-primitive data needed while building.
struct BuildInput {
    boxes: Vec<BoundingBox>,
    centers: Vec<Vec3>,
    split: SplitPlacement,
}

/// A BVH over a primitive array.
///
/// The same primitive slice passed to `build` must be passed to the queries.
#[derive(Debug, Default)]
pub struct Bvh {
    root: Option<BvhNode>,
    /// Permutation of primitive indices; leaves cover it left to right
    order: Vec<usize>,
}

impl Bvh {
    /// Build a BVH over `primitives`. An empty slice gives a BVH that misses
    /// every ray.
    pub fn build(primitives: &[Primitive], split: SplitPlacement) -> Self {
        let boxes: Vec<BoundingBox> = primitives.iter().map(Primitive::bounding_box).collect();
        let centers = boxes.iter().map(BoundingBox::center).collect();
        let input = BuildInput {
            boxes,
            centers,
            split,
        };

        let mut order: Vec<usize> = (0..primitives.len()).collect();
        let root = if order.is_empty() {
            None
        } else {
            Some(Self::build_range(&input, &mut order, 0..primitives.len()))
        };

        let bvh = Self { root, order };
        log::debug!(
            "Built BVH ({:?} split): {} primitives, {} nodes, depth {}",
            split,
            primitives.len(),
            bvh.node_count(),
            bvh.depth()
        );
        bvh
    }

    /// Recursive construction over `order[range]`.
    fn build_range(input: &BuildInput, order: &mut [usize], range: Range<usize>) -> BvhNode {
        let mut bbox = BoundingBox::EMPTY;
        for &i in &order[range.clone()] {
            bbox.expand(&input.boxes[i]);
        }

        if range.len() == 1 {
            return BvhNode::Leaf {
                bbox,
                index: order[range.start],
            };
        }

        let dim = bbox.max_dimension();
        let split = input.split.split_value(&bbox, dim);

        // Move primitives whose center lies below the split to the front.
        let mut mid = range.start;
        for i in range.clone() {
            if axis(input.centers[order[i]], dim) < split {
                order.swap(i, mid);
                mid += 1;
            }
        }
        if mid == range.start || mid == range.end {
            mid = (range.start + range.end) / 2;
        }

        log::trace!(
            "BVH split {:?} on axis {} at {}: {} | {}",
            range,
            dim,
            split,
            mid - range.start,
            range.end - mid
        );

        let left = Self::build_range(input, order, range.start..mid);
        let right = Self::build_range(input, order, mid..range.end);

        BvhNode::Branch {
            bbox,
            range,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn root(&self) -> Option<&BvhNode> {
        self.root.as_ref()
    }

    /// The primitive permutation produced by the build.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Bounds of the whole hierarchy (empty for an empty BVH).
    pub fn bounding_box(&self) -> BoundingBox {
        self.root
            .as_ref()
            .map_or(BoundingBox::EMPTY, BvhNode::bounding_box)
    }

    pub fn node_count(&self) -> usize {
        self.root.as_ref().map_or(0, BvhNode::node_count)
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, BvhNode::depth)
    }

    /// Primitive indices in leaf order (left to right).
    pub fn leaves(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.order.len());
        if let Some(root) = &self.root {
            root.collect_leaves(&mut out);
        }
        out
    }

    /// Nearest intersection with `0 < t`, skipping `exclude`.
    pub fn closest_hit(
        &self,
        primitives: &[Primitive],
        ray: &Ray,
        exclude: Option<PrimitiveId>,
    ) -> Option<HitRecord> {
        let root = self.root.as_ref()?;
        if root.bounding_box().does_intersect(ray) == f32::INFINITY {
            return None;
        }

        let mut best = None;
        Self::closest_in(root, primitives, ray, exclude, &mut best);
        best
    }

    fn closest_in(
        node: &BvhNode,
        primitives: &[Primitive],
        ray: &Ray,
        exclude: Option<PrimitiveId>,
        best: &mut Option<HitRecord>,
    ) {
        match node {
            BvhNode::Leaf { index, .. } => {
                let id = PrimitiveId(*index);
                if exclude == Some(id) {
                    return;
                }
                if let Some(mut hit) = primitives[*index].intersect(ray) {
                    let best_t = best.map_or(f32::INFINITY, |b| b.t);
                    if hit.t > 0.0 && hit.t < best_t {
                        hit.primitive = id;
                        *best = Some(hit);
                    }
                }
            }
            BvhNode::Branch { left, right, .. } => {
                let t_left = left.bounding_box().does_intersect(ray);
                let t_right = right.bounding_box().does_intersect(ray);
                let (near, t_near, far, t_far) = if t_left <= t_right {
                    (left, t_left, right, t_right)
                } else {
                    (right, t_right, left, t_left)
                };

                if t_near < best.map_or(f32::INFINITY, |b| b.t) {
                    Self::closest_in(near, primitives, ray, exclude, best);
                }
                if t_far < best.map_or(f32::INFINITY, |b| b.t) {
                    Self::closest_in(far, primitives, ray, exclude, best);
                }
            }
        }
    }

    /// Whether any primitive other than `exclude` is hit with
    /// `0 < t <= tmax + EPSILON`.
    pub fn any_hit(
        &self,
        primitives: &[Primitive],
        ray: &Ray,
        tmax: f32,
        exclude: Option<PrimitiveId>,
    ) -> bool {
        let Some(root) = self.root.as_ref() else {
            return false;
        };
        let limit = tmax + EPSILON;
        root.bounding_box().does_intersect(ray) <= limit
            && Self::any_in(root, primitives, ray, limit, exclude)
    }

    fn any_in(
        node: &BvhNode,
        primitives: &[Primitive],
        ray: &Ray,
        limit: f32,
        exclude: Option<PrimitiveId>,
    ) -> bool {
        match node {
            BvhNode::Leaf { index, .. } => {
                if exclude == Some(PrimitiveId(*index)) {
                    return false;
                }
                primitives[*index]
                    .intersect(ray)
                    .is_some_and(|hit| hit.t > 0.0 && hit.t <= limit)
            }
            BvhNode::Branch { left, right, .. } => {
                let t_left = left.bounding_box().does_intersect(ray);
                let t_right = right.bounding_box().does_intersect(ray);
                let (near, t_near, far, t_far) = if t_left <= t_right {
                    (left, t_left, right, t_right)
                } else {
                    (right, t_right, left, t_left)
                };

                (t_near <= limit && Self::any_in(near, primitives, ray, limit, exclude))
                    || (t_far <= limit && Self::any_in(far, primitives, ray, limit, exclude))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Face, Sphere};
    use lumen_math::Vec2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sphere(center: Vec3, radius: f32) -> Primitive {
        Sphere::new(center, radius, 0, None).into()
    }

    fn random_vec3(rng: &mut StdRng, range: f32) -> Vec3 {
        Vec3::new(
            rng.gen_range(-range..range),
            rng.gen_range(-range..range),
            rng.gen_range(-range..range),
        )
    }

    fn random_scene(rng: &mut StdRng, count: usize) -> Vec<Primitive> {
        (0..count)
            .map(|i| {
                let base = random_vec3(rng, 10.0);
                if i % 3 == 0 {
                    sphere(base, rng.gen_range(0.2..1.5))
                } else {
                    Face::new(
                        [base, base + random_vec3(rng, 2.0), base + random_vec3(rng, 2.0)],
                        [Vec2::ZERO; 3],
                        i,
                        None,
                    )
                    .into()
                }
            })
            .collect()
    }

    fn random_ray(rng: &mut StdRng) -> Ray {
        let origin = random_vec3(rng, 15.0);
        let target = random_vec3(rng, 8.0);
        let direction = (target - origin).normalize();
        if rng.gen_bool(0.5) {
            Ray::shadow(origin, direction)
        } else {
            Ray::new(origin, direction)
        }
    }

    fn brute_closest(primitives: &[Primitive], ray: &Ray, exclude: Option<PrimitiveId>) -> Option<f32> {
        primitives
            .iter()
            .enumerate()
            .filter(|(i, _)| exclude != Some(PrimitiveId(*i)))
            .filter_map(|(_, p)| p.intersect(ray))
            .map(|hit| hit.t)
            .filter(|&t| t > 0.0)
            .reduce(f32::min)
    }

    fn brute_any(primitives: &[Primitive], ray: &Ray, tmax: f32, exclude: Option<PrimitiveId>) -> bool {
        primitives.iter().enumerate().any(|(i, p)| {
            exclude != Some(PrimitiveId(i))
                && p.intersect(ray).is_some_and(|hit| hit.t > 0.0 && hit.t <= tmax + EPSILON)
        })
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = Bvh::build(&[], SplitPlacement::Center);
        assert!(bvh.root().is_none());
        assert_eq!(bvh.node_count(), 0);
        assert!(bvh.bounding_box().is_empty());

        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        assert!(bvh.closest_hit(&[], &ray, None).is_none());
        assert!(!bvh.any_hit(&[], &ray, f32::INFINITY, None));
    }

    #[test]
    fn test_bvh_single_sphere() {
        let primitives = vec![sphere(Vec3::new(0.0, 0.0, -1.0), 0.5)];
        let bvh = Bvh::build(&primitives, SplitPlacement::Center);

        // Should create a leaf
        assert!(matches!(bvh.root(), Some(BvhNode::Leaf { index: 0, .. })));

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = bvh.closest_hit(&primitives, &ray, None).unwrap();
        assert!((hit.t - 0.5).abs() < 1e-5);
        assert_eq!(hit.primitive, PrimitiveId(0));
    }

    #[test]
    fn test_bvh_multiple_spheres() {
        let primitives: Vec<Primitive> = (0..10)
            .map(|i| sphere(Vec3::new(i as f32, 0.0, -5.0), 0.4))
            .collect();
        let bvh = Bvh::build(&primitives, SplitPlacement::Center);

        // Ray that hits sphere at x=5
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = bvh.closest_hit(&primitives, &ray, None).unwrap();
        assert_eq!(hit.primitive, PrimitiveId(5));
        assert!((hit.t - 4.6).abs() < 1e-4);

        // Along the row, the first sphere wins.
        let ray = Ray::new(Vec3::new(-5.0, 0.0, -5.0), Vec3::X);
        let hit = bvh.closest_hit(&primitives, &ray, None).unwrap();
        assert_eq!(hit.primitive, PrimitiveId(0));
    }

    #[test]
    fn test_branch_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let primitives = random_scene(&mut rng, 50);
        let bvh = Bvh::build(&primitives, SplitPlacement::Center);

        fn check(node: &BvhNode, primitives: &[Primitive]) -> usize {
            match node {
                BvhNode::Leaf { bbox, index } => {
                    assert_eq!(*bbox, primitives[*index].bounding_box());
                    1
                }
                BvhNode::Branch { bbox, range, left, right } => {
                    let mut union = left.bounding_box();
                    union.expand(&right.bounding_box());
                    assert_eq!(*bbox, union);

                    let n = check(left, primitives) + check(right, primitives);
                    assert_eq!(n, range.len());
                    n
                }
            }
        }

        let root = bvh.root().unwrap();
        assert_eq!(check(root, &primitives), primitives.len());
        assert_eq!(bvh.node_count(), 2 * primitives.len() - 1);
    }

    #[test]
    fn test_leaves_cover_input_exactly() {
        let mut rng = StdRng::seed_from_u64(11);
        for split in [SplitPlacement::Center, SplitPlacement::Verbatim] {
            let primitives = random_scene(&mut rng, 137);
            let bvh = Bvh::build(&primitives, split);

            let leaves = bvh.leaves();
            assert_eq!(leaves, bvh.order());

            let mut sorted = leaves.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..primitives.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_identical_centers_fall_back_to_midpoint() {
        let primitives: Vec<Primitive> = (0..8).map(|_| sphere(Vec3::ONE, 1.0)).collect();
        let bvh = Bvh::build(&primitives, SplitPlacement::Center);

        assert_eq!(bvh.leaves().len(), 8);
        assert_eq!(bvh.depth(), 4);
    }

    #[test]
    fn test_exclude_skips_primitive() {
        let primitives = vec![
            sphere(Vec3::new(0.0, 0.0, -2.0), 0.5),
            sphere(Vec3::new(0.0, 0.0, -6.0), 0.5),
        ];
        let bvh = Bvh::build(&primitives, SplitPlacement::Center);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);

        let hit = bvh.closest_hit(&primitives, &ray, Some(PrimitiveId(0))).unwrap();
        assert_eq!(hit.primitive, PrimitiveId(1));

        assert!(bvh.any_hit(&primitives, &ray, 3.0, None));
        assert!(!bvh.any_hit(&primitives, &ray, 3.0, Some(PrimitiveId(0))));
        assert!(bvh.any_hit(&primitives, &ray, 10.0, Some(PrimitiveId(0))));
    }

    #[test]
    fn test_any_hit_tmax_boundary() {
        let primitives = vec![sphere(Vec3::new(0.0, 0.0, -5.0), 1.0)];
        let bvh = Bvh::build(&primitives, SplitPlacement::Center);
        let ray = Ray::shadow(Vec3::ZERO, -Vec3::Z);

        // The sphere's surface is at t = 4.
        assert!(bvh.any_hit(&primitives, &ray, 4.0, None));
        assert!(!bvh.any_hit(&primitives, &ray, 3.9, None));
    }

    #[test]
    fn test_hits_behind_origin_are_ignored() {
        let primitives = vec![sphere(Vec3::new(0.0, 0.0, 5.0), 1.0)];
        let bvh = Bvh::build(&primitives, SplitPlacement::Center);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);

        assert!(bvh.closest_hit(&primitives, &ray, None).is_none());
        assert!(!bvh.any_hit(&primitives, &ray, f32::INFINITY, None));
    }

    #[test]
    fn test_closest_hit_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        for split in [SplitPlacement::Center, SplitPlacement::Verbatim] {
            let primitives = random_scene(&mut rng, 120);
            let bvh = Bvh::build(&primitives, split);

            for _ in 0..500 {
                let ray = random_ray(&mut rng);
                let exclude = if rng.gen_bool(0.3) {
                    Some(PrimitiveId(rng.gen_range(0..primitives.len())))
                } else {
                    None
                };

                let expected = brute_closest(&primitives, &ray, exclude);
                let actual = bvh.closest_hit(&primitives, &ray, exclude);
                match (expected, actual) {
                    (None, None) => {}
                    (Some(t), Some(hit)) => {
                        assert!((t - hit.t).abs() < 1e-4, "{:?}: brute {} vs bvh {}", split, t, hit.t);
                        assert_ne!(Some(hit.primitive), exclude);
                    }
                    (e, a) => panic!("{:?}: brute {:?} vs bvh {:?}", split, e, a),
                }
            }
        }
    }

    #[test]
    fn test_any_hit_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(1234);
        for split in [SplitPlacement::Center, SplitPlacement::Verbatim] {
            let primitives = random_scene(&mut rng, 120);
            let bvh = Bvh::build(&primitives, split);

            for _ in 0..500 {
                let ray = random_ray(&mut rng);
                let tmax = rng.gen_range(0.5f32..30.0);
                let exclude = Some(PrimitiveId(rng.gen_range(0..primitives.len())));

                assert_eq!(
                    bvh.any_hit(&primitives, &ray, tmax, exclude),
                    brute_any(&primitives, &ray, tmax, exclude),
                    "{:?}: tmax {}",
                    split,
                    tmax
                );
            }
        }
    }
}
