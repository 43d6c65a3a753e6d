use crate::{Point2f, Vec3f, Point3f, Float, Ray, offset_ray_origin};
use crate::err_float::SHADOW_EPSILON;
use crate::geometry::Normal3;
use cgmath::InnerSpace;

/// A point on a surface (or in a medium) together with a bound on its floating point error.
///
/// `n` is the geometric normal and is zero for points that do not lie on a surface.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceHit {
    pub p: Point3f,
    pub p_err: Vec3f,
    pub time: Float,
    pub n: Normal3,
}

impl SurfaceHit {
    pub fn at_point(p: Point3f, time: Float) -> Self {
        Self { p, p_err: Vec3f::new(0.0, 0.0, 0.0), time, n: Normal3::zero() }
    }

    pub fn spawn_ray(&self, dir: Vec3f) -> Ray {
        let origin = offset_ray_origin(self.p, self.p_err, self.n, dir);
        Ray { origin, dir, t_min: 0.0, t_max: Float::INFINITY, time: self.time }
    }

    /// A ray from this point that stops just short of `p`.
    pub fn spawn_ray_to(&self, p: Point3f) -> Ray {
        let origin = offset_ray_origin(self.p, self.p_err, self.n, p - self.p);
        let dir = p - origin;
        Ray { origin, dir, t_min: 0.0, t_max: 1.0 - SHADOW_EPSILON, time: self.time }
    }

    /// A ray between two surface points, with both ends offset off their surfaces.
    pub fn spawn_ray_to_hit(&self, other: &SurfaceHit) -> Ray {
        let origin = offset_ray_origin(self.p, self.p_err, self.n, other.p - self.p);
        let target = offset_ray_origin(other.p, other.p_err, other.n, origin - other.p);
        let dir = target - origin;
        Ray { origin, dir, t_min: 0.0, t_max: 1.0 - SHADOW_EPSILON, time: self.time }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DiffGeom {
    pub dpdu: Vec3f,
    pub dpdv: Vec3f,
    pub dndu: Normal3,
    pub dndv: Normal3
}

#[derive(Clone, Copy, Debug)]
pub struct SurfaceInteraction {
    pub hit: SurfaceHit,

    /// (u, v) coordinates from the parametrization of the surface
    pub uv: Point2f,

    /// Outgoing direction, pointing back towards the ray origin
    pub wo: Vec3f,

    pub geom: DiffGeom,

    pub shading_n: Normal3,

    pub shading_geom: DiffGeom,
}

impl SurfaceInteraction {
    pub fn new(
        p: Point3f,
        p_err: Vec3f,
        time: Float,
        uv: Point2f,
        wo: Vec3f,
        n: Normal3,
        geom: DiffGeom
    ) -> Self {
        Self {
            hit: SurfaceHit { p, p_err, time, n },
            uv,
            wo,
            geom,

            shading_n: n,
            shading_geom: geom
        }
    }

    pub fn n(&self) -> Normal3 {
        self.hit.n
    }

    /// Set the shading frame. The geometric normal is flipped if needed so that both normals
    /// lie in the same hemisphere.
    pub fn set_shading_geometry(&mut self, shading_n: Normal3, shading_geom: DiffGeom) {
        self.shading_n = shading_n;
        self.hit.n = self.hit.n.faceforward(shading_n.0);
        self.shading_geom = shading_geom;
    }

    pub fn spawn_ray(&self, dir: Vec3f) -> Ray {
        self.hit.spawn_ray(dir)
    }

    /// Whether `w` is on the side of the surface that the geometric normal points to.
    pub fn is_outside(&self, w: Vec3f) -> bool {
        w.dot(self.hit.n.0) > 0.0
    }
}
