use crate::{Transform, Point3f, Float, Point2f, Vec3f, Error};
use crate::consts::PI;
use crate::spectrum::Spectrum;
use crate::light::{Light, LightFlags, LiSample, VisibilityTester, check_radiance};
use crate::interaction::SurfaceHit;
use cgmath::{InnerSpace, EuclideanSpace};

/// An isotropic point source.
pub struct PointLight {
    world_point: Point3f,
    intensity: Spectrum,
    ignore_first_medium: bool,
}

impl PointLight {
    pub fn new(light_to_world: Transform, intensity: Spectrum) -> Result<Self, Error> {
        let world_point = light_to_world.transform(Point3f::origin());
        Ok(Self {
            world_point,
            intensity: check_radiance("point light intensity", intensity)?,
            ignore_first_medium: false,
        })
    }

    pub fn at(p: Point3f, intensity: Spectrum) -> Result<Self, Error> {
        Self::new(Transform::translate(p.to_vec()), intensity)
    }

    pub fn with_ignore_first_medium(self, ignore_first_medium: bool) -> Self {
        Self { ignore_first_medium, ..self }
    }
}

impl Light for PointLight {
    fn flags(&self) -> LightFlags {
        LightFlags::DeltaPosition
    }

    fn sample_incident_radiance(&self, reference: &SurfaceHit, _u: Point2f) -> Option<LiSample> {
        let d = self.world_point - reference.p;
        let dist2 = d.magnitude2();
        if dist2 == 0.0 {
            return None;
        }
        let vis = VisibilityTester {
            p0: *reference,
            p1: SurfaceHit::at_point(self.world_point, reference.time),
        };
        Some(LiSample {
            radiance: self.intensity / dist2,
            wi: d / dist2.sqrt(),
            pdf: 1.0,
            vis,
        })
    }

    fn pdf_incident_radiance(&self, _reference: &SurfaceHit, _wi: Vec3f) -> Float {
        0.0
    }

    fn power(&self) -> Spectrum {
        4.0 * PI * self.intensity
    }

    fn ignores_first_medium(&self) -> bool {
        self.ignore_first_medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_inverse_square_falloff() -> anyhow::Result<()> {
        let light = PointLight::at(point3f!(0, 4, 0), Spectrum::uniform(8.0))?;
        let reference = SurfaceHit::at_point(point3f!(0, 2, 0), 0.0);
        let ls = light.sample_incident_radiance(&reference, Point2f::new(0.5, 0.5))
            .ok_or_else(|| anyhow::anyhow!("no sample"))?;
        assert_abs_diff_eq!(ls.radiance[0], 2.0, epsilon = 1.0e-5);
        assert_abs_diff_eq!(ls.wi, vec3f!(0, 1, 0), epsilon = 1.0e-6);
        assert_eq!(ls.pdf, 1.0);
        assert!(light.flags().is_delta_light());
        Ok(())
    }

    #[test]
    fn test_rejects_negative_intensity() {
        assert!(PointLight::at(point3f!(0, 0, 0), Spectrum::uniform(-1.0)).is_err());
    }
}
