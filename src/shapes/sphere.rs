use crate::{Float, distance, Normal3, Point3f, Vec3f, Point2f, ComponentWiseExt, Error};
use crate::EFloat;
use crate::consts::PI;
use crate::err_float::gamma;
use crate::interaction::{DiffGeom, SurfaceHit, SurfaceInteraction};
use crate::math::quadratic;
use crate::geometry::{Transform, Ray};
use crate::geometry::bounds::Bounds3f;
use crate::sampling::uniform_sample_sphere;
use crate::shapes::Shape;
use cgmath::{InnerSpace, EuclideanSpace};

/// A full sphere centered at the object space origin.
///
/// The object to world transform is expected to be rigid (rotation and translation), since the
/// surface area is computed in object space.
#[derive(Debug)]
pub struct Sphere {
    object_to_world: Transform,
    world_to_object: Transform,
    radius: Float,
}

impl Sphere {
    pub fn new(object_to_world: Transform, radius: Float) -> Result<Self, Error> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(Error::DegenerateGeometry(format!("sphere radius {}", radius)));
        }
        let center = object_to_world.transform(Point3f::origin());
        if !center.is_finite() {
            return Err(Error::DegenerateGeometry(format!("sphere center {:?}", center)));
        }

        Ok(Self {
            object_to_world,
            world_to_object: object_to_world.inverse(),
            radius,
        })
    }

    pub fn at(center: Point3f, radius: Float) -> Result<Self, Error> {
        Self::new(Transform::translate(center.to_vec()), radius)
    }

    pub fn radius(&self) -> Float {
        self.radius
    }

    /// Returns the object space ray and parametric distance of the nearest hit.
    fn nearest_hit(&self, ray: &Ray) -> Option<(Ray, EFloat)> {
        let (ray, (origin_err, dir_err)) = self.world_to_object.tf_exact_to_err(*ray);

        let ox = EFloat::with_err(ray.origin.x, origin_err.x);
        let oy = EFloat::with_err(ray.origin.y, origin_err.y);
        let oz = EFloat::with_err(ray.origin.z, origin_err.z);
        let dirx = EFloat::with_err(ray.dir.x, dir_err.x);
        let diry = EFloat::with_err(ray.dir.y, dir_err.y);
        let dirz = EFloat::with_err(ray.dir.z, dir_err.z);

        let a = dirx * dirx + diry * diry + dirz * dirz;
        let b = 2.0 * (dirx * ox + diry * oy + dirz * oz);
        let c = ox * ox + oy * oy + oz * oz - EFloat::new(self.radius) * EFloat::new(self.radius);

        let (t0, t1) = quadratic(a, b, c)?;

        if t0.upper_bound() > ray.t_max || t1.lower_bound() <= ray.t_min {
            return None;
        }

        // find the closest valid intersection t value
        let mut t_shape_hit = t0;
        if t_shape_hit.lower_bound() <= ray.t_min {
            t_shape_hit = t1;
            if t_shape_hit.upper_bound() > ray.t_max {
                return None
            }
        }

        Some((ray, t_shape_hit))
    }
}

impl Shape for Sphere {
    fn world_bound(&self) -> Bounds3f {
        let r = self.radius;
        self.object_to_world.transform(bounds3f!((-r, -r, -r), (r, r, r)))
    }

    #[allow(non_snake_case)]
    fn intersect(&self, ray: &Ray) -> Option<(Float, SurfaceInteraction)> {
        let (ray, t_shape_hit) = self.nearest_hit(ray)?;

        let mut p_hit = ray.at(t_shape_hit.into());

        // refine the hit point by reprojecting it onto the surface
        p_hit *= self.radius / distance(p_hit, point3f!(0, 0, 0));
        if p_hit.x == 0.0 && p_hit.y == 0.0 { p_hit.x = 1.0e-5 * self.radius }
        let mut phi = Float::atan2(p_hit.y, p_hit.x);
        if phi < 0.0 { phi += 2.0 * PI }

        // u wraps around the z axis, v runs from the -z pole to the +z pole
        let phi_max = 2.0 * PI;
        let theta_min = PI;
        let theta_max = 0.0;

        let u = phi / phi_max;
        let theta = Float::acos((p_hit.z / self.radius).clamp(-1.0, 1.0));
        let v = (theta - theta_min) / (theta_max - theta_min);

        let z_radius = (p_hit.x * p_hit.x + p_hit.y * p_hit.y).sqrt();
        let inv_z_radius = 1.0 / z_radius;
        let cos_phi = p_hit.x * inv_z_radius;
        let sin_phi = p_hit.y * inv_z_radius;

        let dpdu = vec3f!(-phi_max * p_hit.y, phi_max * p_hit.x, 0.0);
        let dpdv = (theta_max - theta_min) *
            vec3f!(p_hit.z * cos_phi, p_hit.z * sin_phi, -self.radius * theta.sin());

        let d2pduu = (-phi_max * phi_max) * vec3f!(p_hit.x, p_hit.y, 0.0);
        let d2pduv = (theta_max - theta_min) * p_hit.z * phi_max * vec3f!(-sin_phi, cos_phi, 0.0);
        let d2pdvv = -(theta_max - theta_min) * (theta_max - theta_min) *
            vec3f!(p_hit.x, p_hit.y, p_hit.z);

        // Weingarten equations for the normal derivatives
        let E = dpdu.dot(dpdu);
        let F = dpdu.dot(dpdv);
        let G = dpdv.dot(dpdv);

        let N = dpdu.cross(dpdv).normalize();

        let e = N.dot(d2pduu);
        let f = N.dot(d2pduv);
        let g = N.dot(d2pdvv);

        let invEGF2 = 1.0 / (E * G - F * F);

        let dndu = Normal3((f * F - e * G) * invEGF2 * dpdu + (e * F - f * E) * invEGF2 * dpdv);

        let dndv = Normal3((g * F - f * G) * invEGF2 * dpdu + (f * F - g * E) * invEGF2 * dpdv);

        let p_err: Vec3f = gamma(5) * p_hit.to_vec().abs();

        let interact = SurfaceInteraction::new(
            p_hit,
            p_err,
            ray.time,
            Point2f::new(u, v),
            -ray.dir,
            Normal3(N),
            DiffGeom { dpdu, dpdv, dndu, dndv }
        );

        let world_intersect = self.object_to_world.transform(interact);

        Some((t_shape_hit.into(), world_intersect))
    }

    fn intersect_test(&self, ray: &Ray) -> bool {
        self.nearest_hit(ray).is_some()
    }

    fn area(&self) -> Float {
        4.0 * PI * self.radius * self.radius
    }

    fn sample(&self, u: Point2f) -> SurfaceHit {
        let p_obj = point3f!(0, 0, 0) + self.radius * uniform_sample_sphere(u);
        let n = self.object_to_world.transform(Normal3(p_obj.to_vec())).normalize();

        let p_obj_err = gamma(5) * p_obj.to_vec().abs();
        let (p, p_err) = self.object_to_world.tf_err_to_err(p_obj, p_obj_err);
        SurfaceHit { p, p_err, time: 0.0, n }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sphere_hit_from_outside() -> anyhow::Result<()> {
        let s = Sphere::at(point3f!(0, 0, 5), 1.0)?;
        let ray = Ray::new(point3f!(0, 0, 0), vec3f!(0, 0, 1));
        let (t, si) = s.intersect(&ray).ok_or_else(|| anyhow::anyhow!("missed"))?;
        assert_abs_diff_eq!(t, 4.0, epsilon = 1.0e-4);
        assert_abs_diff_eq!(si.hit.p, point3f!(0, 0, 4), epsilon = 1.0e-4);
        // outward facing normal
        assert_abs_diff_eq!(si.hit.n.0, vec3f!(0, 0, -1), epsilon = 1.0e-4);
        assert_abs_diff_eq!(si.wo, vec3f!(0, 0, -1), epsilon = 1.0e-4);
        assert!(s.intersect_test(&ray));
        Ok(())
    }

    #[test]
    fn test_sphere_hit_from_inside_and_range() -> anyhow::Result<()> {
        let s = Sphere::at(point3f!(0, 0, 0), 2.0)?;
        let ray = Ray::new(point3f!(0, 0, 0), vec3f!(1, 0, 0));
        let (t, si) = s.intersect(&ray).ok_or_else(|| anyhow::anyhow!("missed"))?;
        assert_abs_diff_eq!(t, 2.0, epsilon = 1.0e-4);
        assert!(si.hit.n.x > 0.0);

        assert!(s.intersect(&ray.clipped(1.5)).is_none());
        assert!(!s.intersect_test(&ray.clipped(1.5)));
        Ok(())
    }

    #[test]
    fn test_sphere_rejects_degenerate() {
        assert!(Sphere::at(point3f!(0, 0, 0), 0.0).is_err());
        assert!(Sphere::at(point3f!(0, 0, 0), Float::NAN).is_err());
        assert!(Sphere::at(point3f!(Float::INFINITY, 0, 0), 1.0).is_err());
    }

    #[test]
    fn test_sphere_sample_on_surface() -> anyhow::Result<()> {
        let s = Sphere::at(point3f!(1, 2, 3), 0.5)?;
        for u in [Point2f::new(0.1, 0.2), Point2f::new(0.9, 0.6)] {
            let hit = s.sample(u);
            assert_abs_diff_eq!(distance(hit.p, point3f!(1, 2, 3)), 0.5, epsilon = 1.0e-4);
            assert_abs_diff_eq!(hit.n.0, (hit.p - point3f!(1, 2, 3)).normalize(), epsilon = 1.0e-4);
        }
        Ok(())
    }
}
