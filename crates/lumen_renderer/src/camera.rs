//! Pinhole camera ray generation.

use lumen_core::Camera;
use lumen_math::{Ray, Vec3};

/// Near-plane geometry of a scene camera, computed once per render.
#[derive(Debug, Clone, Copy)]
pub struct ImagePlane {
    /// Ray origin for every pixel
    position: Vec3,
    /// Top-left corner of the near plane
    q: Vec3,
    /// One pixel step to the right
    su: Vec3,
    /// One pixel step up
    sv: Vec3,
    pub width: u32,
    pub height: u32,
}

impl ImagePlane {
    pub fn new(camera: &Camera) -> Self {
        let gaze = camera.gaze.normalize_or_zero();
        let u = gaze.cross(camera.up).normalize_or_zero();
        let v = u.cross(gaze);

        let m = camera.position + gaze * camera.near_distance;
        let q = m + u * camera.left() + v * camera.top();

        let width = camera.image_width.max(1) as f32;
        let height = camera.image_height.max(1) as f32;
        let su = u * (camera.right() - camera.left()) / width;
        let sv = v * (camera.top() - camera.bottom()) / height;

        Self {
            position: camera.position,
            q,
            su,
            sv,
            width: camera.image_width,
            height: camera.image_height,
        }
    }

    /// Primary ray through the center of pixel `(i, j)`; row 0 is the top.
    pub fn primary_ray(&self, i: u32, j: u32) -> Ray {
        let s = self.q + self.su * (i as f32 + 0.5) - self.sv * (j as f32 + 0.5);
        Ray::new(self.position, (s - self.position).normalize())
    }
}
