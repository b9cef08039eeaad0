// Object transform helpers for Mat4.
//
// glam::Mat4 already provides transform_point3(), transform_vector3() and inverse().

use crate::BoundingBox;
use glam::{Mat3, Mat4, Vec3};

/// Extension trait for Mat4 used when placing transformed spheres and
/// mesh instances in the world.
pub trait Mat4Ext {
    /// Bounding box of the 8 transformed corners of `bbox`.
    /// The empty box stays empty.
    fn transform_box(&self, bbox: &BoundingBox) -> BoundingBox;

    /// Matrix that carries object-space normals to world space
    /// (inverse transpose of the upper 3x3).
    fn normal_matrix(&self) -> Mat3;
}

impl Mat4Ext for Mat4 {
    fn transform_box(&self, bbox: &BoundingBox) -> BoundingBox {
        if bbox.is_empty() {
            return BoundingBox::EMPTY;
        }

        let (lo, hi) = (bbox.min, bbox.max);
        let mut out = BoundingBox::EMPTY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            out.expand_point(self.transform_point3(corner));
        }
        out
    }

    fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(*self).inverse().transpose()
    }
}
