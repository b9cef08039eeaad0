use crate::{axis, Ray, Vec3, EPSILON};

/// Axis-aligned bounding box used by the BVH.
///
/// The empty box has `min = +inf` and `max = -inf` on every axis, so that the
/// first `expand` call replaces it with the other box and it never intersects
/// a ray.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// The empty box (contains nothing).
    pub const EMPTY: BoundingBox = BoundingBox {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create a box from its corners. The caller guarantees `min <= max`.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create the smallest box containing both points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Grow this box in place so that it also contains `other`.
    pub fn expand(&mut self, other: &BoundingBox) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Grow this box in place so that it also contains `point`.
    pub fn expand_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// True until the box has been expanded by at least one non-empty box.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the largest extent.
    ///
    /// Ties go to the earlier axis: X beats Y and Z, Y beats Z.
    pub fn max_dimension(&self) -> usize {
        let delta = self.extent();
        if delta.x >= delta.y && delta.x >= delta.z {
            0
        } else if delta.y >= delta.z {
            1
        } else {
            2
        }
    }

    /// Slab test against a ray.
    ///
    /// Returns the parametric entry distance, which is negative when the ray
    /// origin lies inside the box, or `f32::INFINITY` when the ray's line
    /// misses the box. Axes along which the direction is (nearly) zero are
    /// skipped.
    pub fn does_intersect(&self, ray: &Ray) -> f32 {
        if self.is_empty() {
            return f32::INFINITY;
        }

        let mut tnmax = f32::NEG_INFINITY;
        let mut tfmin = f32::INFINITY;
        for i in 0..3 {
            let d = axis(ray.direction, i);
            if d.abs() < EPSILON {
                continue;
            }
            let o = axis(ray.origin, i);
            let mut tn = (axis(self.min, i) - o) / d;
            let mut tf = (axis(self.max, i) - o) / d;
            if d < 0.0 {
                std::mem::swap(&mut tn, &mut tf);
            }
            tnmax = tnmax.max(tn);
            tfmin = tfmin.min(tf);
            if tnmax > tfmin {
                return f32::INFINITY;
            }
        }
        tnmax
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.max + self.min) * 0.5
    }

    /// Inclusive containment test.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Volume of the box; zero for flat or empty boxes.
    pub fn volume(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let e = self.extent();
        e.x * e.y * e.z
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_from_points_orders_corners() {
        let b = BoundingBox::from_points(Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(b.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(b.max, Vec3::new(10.0, 10.0, 5.0));
    }

    #[test]
    fn test_empty_box_expands_to_other() {
        let mut b = BoundingBox::EMPTY;
        assert!(b.is_empty());

        b.expand(&unit_box());
        assert_eq!(b, unit_box());
        assert!(!b.is_empty());
    }

    #[test]
    fn test_empty_box_never_intersects() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(BoundingBox::EMPTY.does_intersect(&ray), f32::INFINITY);

        let degenerate = Ray::new(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(BoundingBox::EMPTY.does_intersect(&degenerate), f32::INFINITY);
    }

    #[test]
    fn test_max_dimension() {
        let bx = BoundingBox::from_points(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0));
        assert_eq!(bx.max_dimension(), 0);

        let by = BoundingBox::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0));
        assert_eq!(by.max_dimension(), 1);

        let bz = BoundingBox::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0));
        assert_eq!(bz.max_dimension(), 2);
    }

    #[test]
    fn test_max_dimension_ties() {
        let xy = BoundingBox::from_points(Vec3::ZERO, Vec3::new(5.0, 5.0, 1.0));
        assert_eq!(xy.max_dimension(), 0);

        let xz = BoundingBox::from_points(Vec3::ZERO, Vec3::new(5.0, 1.0, 5.0));
        assert_eq!(xz.max_dimension(), 0);

        let yz = BoundingBox::from_points(Vec3::ZERO, Vec3::new(1.0, 5.0, 5.0));
        assert_eq!(yz.max_dimension(), 1);

        let cube = unit_box();
        assert_eq!(cube.max_dimension(), 0);
    }

    #[test]
    fn test_center_and_extent() {
        let b = BoundingBox::from_points(Vec3::new(2.0, 0.0, -4.0), Vec3::new(4.0, 10.0, 0.0));
        assert_eq!(b.center(), Vec3::new(3.0, 5.0, -2.0));
        assert_eq!(b.extent(), Vec3::new(2.0, 10.0, 4.0));
    }

    #[test]
    fn test_does_intersect_hit() {
        let b = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert_eq!(b.does_intersect(&ray), 4.0);
    }

    #[test]
    fn test_does_intersect_miss() {
        let b = unit_box();
        let ray = Ray::new(Vec3::new(10.0, 0.0, -5.0), Vec3::new(0.0, 0.1, 1.0).normalize());
        assert_eq!(b.does_intersect(&ray), f32::INFINITY);
    }

    #[test]
    fn test_does_intersect_behind_origin_is_negative() {
        // The slab test works on the whole line; the entry lies behind the origin.
        let b = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(b.does_intersect(&ray) < 0.0);
    }

    #[test]
    fn test_does_intersect_flat_box() {
        // Bounding box of a triangle lying in the z = 2 plane.
        let b = BoundingBox::from_points(Vec3::new(-1.0, -1.0, 2.0), Vec3::new(1.0, 1.0, 2.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert_eq!(b.does_intersect(&ray), 2.0);
    }

    #[test]
    fn test_does_intersect_parallel_to_slab() {
        let b = unit_box();
        // Only the y slabs take part; x and z are skipped.
        let ray = Ray::new(Vec3::new(0.5, -5.0, 0.0), Vec3::Y);
        assert_eq!(b.does_intersect(&ray), 4.0);
    }

    fn vec3_strategy() -> impl Strategy<Value = Vec3> {
        (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0)
            .prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    fn box_strategy() -> impl Strategy<Value = BoundingBox> {
        (vec3_strategy(), vec3_strategy()).prop_map(|(a, b)| BoundingBox::from_points(a, b))
    }

    fn union(a: &BoundingBox, b: &BoundingBox) -> BoundingBox {
        let mut u = *a;
        u.expand(b);
        u
    }

    proptest! {
        #[test]
        fn expand_is_commutative(a in box_strategy(), b in box_strategy()) {
            prop_assert_eq!(union(&a, &b), union(&b, &a));
        }

        #[test]
        fn expand_is_associative(a in box_strategy(), b in box_strategy(), c in box_strategy()) {
            prop_assert_eq!(union(&union(&a, &b), &c), union(&a, &union(&b, &c)));
        }

        #[test]
        fn expand_is_idempotent(a in box_strategy()) {
            prop_assert_eq!(union(&a, &a), a);
        }

        #[test]
        fn union_contains_both_boxes(a in box_strategy(), b in box_strategy()) {
            let u = union(&a, &b);
            prop_assert!(u.contains_point(a.min) && u.contains_point(a.max));
            prop_assert!(u.contains_point(b.min) && u.contains_point(b.max));
            prop_assert!(u.volume() >= a.volume().max(b.volume()));
        }

        #[test]
        fn ray_from_inside_never_misses(
            b in box_strategy(),
            s in (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0),
            d in vec3_strategy(),
        ) {
            prop_assume!(d.length() > 1e-3);
            let origin = (b.min + b.extent() * Vec3::new(s.0, s.1, s.2)).clamp(b.min, b.max);
            let ray = Ray::new(origin, d.normalize());
            let t = b.does_intersect(&ray);
            prop_assert!(t.is_finite());
            prop_assert!(t <= 0.0);
        }

        #[test]
        fn ray_aimed_at_center_hits(b in box_strategy(), origin in vec3_strategy()) {
            prop_assume!(!b.contains_point(origin));
            prop_assume!((b.center() - origin).length() > 1e-2);
            let ray = Ray::new(origin, (b.center() - origin).normalize());
            let t = b.does_intersect(&ray);
            prop_assert!(t.is_finite());
            prop_assert!(t >= -1e-3);
        }
    }
}
