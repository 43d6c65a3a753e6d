use crate::spectrum::Spectrum;
use crate::{Vec3f, Point3f, Float, Point2f, Bounds3f, Error};
use crate::consts::PI;
use crate::light::{Light, LightFlags, LiSample, VisibilityTester, check_radiance};
use crate::interaction::SurfaceHit;
use cgmath::{InnerSpace, EuclideanSpace};

/// A directional source infinitely far away.
pub struct DistantLight {
    radiance: Spectrum,
    /// Unit direction pointing towards the light
    dir: Vec3f,
    world_center: Point3f,
    world_radius: Float,
    ignore_first_medium: bool,
}

impl DistantLight {
    /// `dir` points from the scene towards the light.
    pub fn new(radiance: Spectrum, dir: Vec3f) -> Result<Self, Error> {
        if !(dir.magnitude2() > 0.0) || !dir.x.is_finite() || !dir.y.is_finite() || !dir.z.is_finite() {
            return Err(Error::InvalidParameter { what: "distant light direction", reason: format!("{:?}", dir) });
        }
        Ok(Self {
            radiance: check_radiance("distant light radiance", radiance)?,
            dir: dir.normalize(),
            world_center: Point3f::origin(),
            world_radius: 0.0,
            ignore_first_medium: false,
        })
    }

    pub fn with_ignore_first_medium(self, ignore_first_medium: bool) -> Self {
        Self { ignore_first_medium, ..self }
    }
}

impl Light for DistantLight {
    fn flags(&self) -> LightFlags {
        LightFlags::DeltaDirection
    }

    fn preprocess(&mut self, world_bound: &Bounds3f) {
        let (world_center, world_radius) = world_bound.bounding_sphere();
        self.world_center = world_center;
        self.world_radius = world_radius;
    }

    fn sample_incident_radiance(&self, reference: &SurfaceHit, _u: Point2f) -> Option<LiSample> {
        // far enough to be outside the scene from any point inside it
        let p_outside = reference.p + self.dir * (2.0 * self.world_radius.max(1.0));

        let vis = VisibilityTester {
            p0: *reference,
            p1: SurfaceHit::at_point(p_outside, reference.time),
        };

        Some(LiSample {
            radiance: self.radiance,
            wi: self.dir,
            pdf: 1.0,
            vis,
        })
    }

    fn pdf_incident_radiance(&self, _reference: &SurfaceHit, _wi: Vec3f) -> Float {
        0.0
    }

    fn power(&self) -> Spectrum {
        PI * self.world_radius * self.world_radius * self.radiance
    }

    fn ignores_first_medium(&self) -> bool {
        self.ignore_first_medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_after_preprocess() -> anyhow::Result<()> {
        let mut light = DistantLight::new(Spectrum::uniform(3.0), vec3f!(0, 2, 0))?;
        light.preprocess(&bounds3f!((-1, -1, -1), (1, 1, 1)));
        let reference = SurfaceHit::at_point(point3f!(0, 0, 0), 0.0);
        let ls = light.sample_incident_radiance(&reference, Point2f::new(0.0, 0.0))
            .ok_or_else(|| anyhow::anyhow!("no sample"))?;
        assert_eq!(ls.wi, vec3f!(0, 1, 0));
        assert!(ls.vis.p1.p.y > 1.0);
        assert!(!light.power().is_black());
        Ok(())
    }

    #[test]
    fn test_rejects_zero_direction() {
        assert!(DistantLight::new(Spectrum::uniform(1.0), vec3f!(0, 0, 0)).is_err());
    }
}
