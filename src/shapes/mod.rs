use crate::geometry::bounds::Bounds3f;
use crate::geometry::Ray;
use crate::interaction::{SurfaceHit, SurfaceInteraction};
use crate::{Float, Point2f, Vec3f};
use cgmath::InnerSpace;

pub mod sphere;
pub mod triangle;

pub use sphere::Sphere;
pub use triangle::{Triangle, TriangleMesh};

/// Geometry that can be intersected and sampled. Shapes live in world space.
pub trait Shape: Send + Sync {
    fn world_bound(&self) -> Bounds3f;

    /// The closest intersection with `ray` inside its `[t_min, t_max]` range.
    fn intersect(&self, ray: &Ray) -> Option<(Float, SurfaceInteraction)>;

    fn intersect_test(&self, ray: &Ray) -> bool {
        self.intersect(ray).is_some()
    }

    fn area(&self) -> Float;

    /// Uniformly sample a point on the surface. The density with respect to area is `1 / area`.
    fn sample(&self, u: Point2f) -> SurfaceHit;

    /// Sample a point on the surface as seen from `reference`, returning the point and its
    /// density with respect to solid angle at the reference point.
    fn sample_from_ref(&self, reference: &SurfaceHit, u: Point2f) -> Option<(SurfaceHit, Float)> {
        let hit = self.sample(u);
        let wi = hit.p - reference.p;
        let dist2 = wi.magnitude2();
        if dist2 == 0.0 {
            return None;
        }
        let wi = wi / dist2.sqrt();
        let cos_light = hit.n.dot(-wi).abs();
        let pdf = dist2 / (cos_light * self.area());
        if pdf.is_finite() { Some((hit, pdf)) } else { None }
    }

    /// The solid angle density of sampling direction `wi` from `reference` with
    /// `sample_from_ref`, or zero if the direction misses the shape.
    fn pdf_from_ref(&self, reference: &SurfaceHit, wi: Vec3f) -> Float {
        let ray = reference.spawn_ray(wi);
        match self.intersect(&ray) {
            Some((_, si)) => solid_angle_pdf(reference, &si.hit, self.area()),
            None => 0.0,
        }
    }
}

/// Convert the area density `1 / area` at `hit` to a solid angle density at `reference`.
pub fn solid_angle_pdf(reference: &SurfaceHit, hit: &SurfaceHit, area: Float) -> Float {
    let d = reference.p - hit.p;
    let dist2 = d.magnitude2();
    if dist2 == 0.0 {
        return 0.0;
    }
    let cos_light = hit.n.dot(d / dist2.sqrt()).abs();
    let pdf = dist2 / (cos_light * area);
    if pdf.is_finite() { pdf } else { 0.0 }
}
