use crate::{Point2f, Vec3f, Float, Ray, Bounds3f, Error};
use crate::interaction::SurfaceHit;
use crate::medium::Medium;
use crate::spectrum::Spectrum;
use crate::scene::Scene;
use std::sync::Arc;

pub mod point;
pub mod distant;
pub mod infinite;
pub mod diffuse;

pub use point::PointLight;
pub use distant::DistantLight;
pub use infinite::InfiniteAreaLight;
pub use diffuse::DiffuseAreaLight;

/// Index of a light in the scene's light list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub usize);

pub trait Light: Sync + Send {
    fn flags(&self) -> LightFlags;

    /// Called once with the bounds of the whole scene before rendering.
    fn preprocess(&mut self, _world_bound: &Bounds3f) {}

    /// Sample a direction towards the light from `reference`. Returns `None` when the sample
    /// carries no contribution.
    fn sample_incident_radiance(&self, reference: &SurfaceHit, u: Point2f) -> Option<LiSample>;

    /// The probability density with respect to solid angle for the light's
    /// `sample_incident_radiance` method to sample the direction `wi` from the reference
    /// point `reference`.
    fn pdf_incident_radiance(&self, reference: &SurfaceHit, wi: Vec3f) -> Float;

    /// Total emitted power, used for power-proportional light selection.
    fn power(&self) -> Spectrum;

    /// Radiance carried along a ray that escapes the scene.
    fn environment_emitted_radiance(&self, _ray: &Ray) -> Spectrum { Spectrum::zero() }

    /// Whether shadow rays towards this light skip the attenuation of the medium they start in.
    fn ignores_first_medium(&self) -> bool { false }
}

pub trait AreaLight: Light {
    /// Given a point on the area light's surface represented by `hit`, evaluate the area light's
    /// emitted radiance `L` in the given outgoing direction `w`.
    fn emitted_radiance(&self, hit: &SurfaceHit, w: Vec3f) -> Spectrum;

    /// Solid angle density at `reference` of sampling the point `hit` on the light, for a
    /// direction that is already known to reach it.
    fn pdf_from_hit(&self, reference: &SurfaceHit, hit: &SurfaceHit) -> Float;

    fn as_light(self: Arc<Self>) -> Arc<dyn Light>;
}

pub struct LiSample {
    pub radiance: Spectrum,

    /// The direction *towards* the illumination
    pub wi: Vec3f,

    pub pdf: Float,

    pub vis: VisibilityTester,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightFlags {
    DeltaPosition, DeltaDirection, Area, Infinite
}

impl LightFlags {
    pub fn is_delta_light(&self) -> bool {
        matches!(self, LightFlags::DeltaDirection | LightFlags::DeltaPosition)
    }
}

pub(crate) fn check_radiance(what: &'static str, s: Spectrum) -> Result<Spectrum, Error> {
    if !s.is_finite() || s.has_negative() {
        return Err(Error::InvalidParameter { what, reason: format!("{:?} must be finite and non-negative", s) });
    }
    Ok(s)
}

/// Shadow ray crossings after which a visibility query gives up.
pub(crate) const MAX_INTERFACE_CROSSINGS: usize = 256;

/// The two end points of a shadow ray.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityTester {
    pub p0: SurfaceHit,
    pub p1: SurfaceHit,
}

impl VisibilityTester {
    pub fn unoccluded(&self, scene: &Scene) -> bool {
        !scene.intersect_test(&self.p0.spawn_ray_to_hit(&self.p1))
    }

    /// Fraction of light that makes it from `p1` to `p0`. Surfaces that only separate media are
    /// crossed, any other surface blocks the ray. `medium` is the medium around `p0`.
    pub fn transmittance(&self, scene: &Scene, medium: Option<&dyn Medium>, ignore_first_medium: bool) -> Spectrum {
        if !scene.has_media(medium) {
            return if self.unoccluded(scene) { Spectrum::uniform(1.0) } else { Spectrum::zero() };
        }
        self.walk(scene, medium, ignore_first_medium, true)
    }

    /// Like `unoccluded`, but surfaces that only separate media let the ray through. Media are
    /// ignored.
    pub fn unblocked(&self, scene: &Scene) -> bool {
        if !scene.has_media(None) {
            return self.unoccluded(scene);
        }
        !self.walk(scene, None, false, false).is_black()
    }

    fn walk(&self, scene: &Scene, medium: Option<&dyn Medium>, ignore_first_medium: bool, attenuate: bool) -> Spectrum {
        let mut ray = self.p0.spawn_ray_to_hit(&self.p1);
        let mut tr = Spectrum::uniform(1.0);
        let mut medium = medium;
        let mut first_segment = true;

        for _ in 0..MAX_INTERFACE_CROSSINGS {
            let isect = scene.intersect(&ray);
            let segment = isect.as_ref().map_or(ray, |i| ray.clipped(i.t));

            if let Some(m) = medium.filter(|_| attenuate) {
                if !(ignore_first_medium && first_segment) {
                    tr *= m.tr(&segment);
                }
            }
            first_segment = false;

            match isect {
                None => return tr,
                Some(i) if i.entity.occludes() => return Spectrum::zero(),
                Some(i) => {
                    medium = i.medium(ray.dir, medium);
                    ray = i.si.hit.spawn_ray_to_hit(&self.p1);
                }
            }

            if tr.is_black() {
                return tr;
            }
        }
        tracing::debug!("shadow ray crossed too many medium interfaces");
        Spectrum::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_flags() {
        assert!(LightFlags::DeltaPosition.is_delta_light());
        assert!(LightFlags::DeltaDirection.is_delta_light());
        assert!(!LightFlags::Area.is_delta_light());
        assert!(!LightFlags::Infinite.is_delta_light());
    }
}
