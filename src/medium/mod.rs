use crate::{Float, Ray, Vec3f, Point2f, Error, SurfaceHit};
use crate::consts::{PI, INV_4_PI};
use crate::geometry::{coordinate_system, spherical_direction_in};
use crate::sampler::Sampler;
use crate::spectrum::Spectrum;
use cgmath::InnerSpace;
use std::sync::Arc;

/// A distribution of scattered directions inside a medium. Both directions point away from the
/// scattering point.
pub trait PhaseFunction {
    fn p(&self, wo: Vec3f, wi: Vec3f) -> Float;

    /// Returns the sampled incident direction and the phase function value, which is also its
    /// density.
    fn sample_p(&self, wo: Vec3f, u: Point2f) -> (Vec3f, Float);
}

#[inline]
fn phase_hg(cos_theta: Float, g: Float) -> Float {
    let denom = 1.0 + g * g + 2.0 * g * cos_theta;
    INV_4_PI * (1.0 - g * g) / (denom * denom.max(0.0).sqrt())
}

#[derive(Clone, Copy, Debug)]
pub struct HenyeyGreenstein {
    pub g: Float,
}

impl HenyeyGreenstein {
    pub fn new(g: Float) -> Result<Self, Error> {
        if !(g > -1.0 && g < 1.0) {
            return Err(Error::InvalidParameter {
                what: "Henyey-Greenstein asymmetry",
                reason: format!("g = {} is not in (-1, 1)", g),
            });
        }
        Ok(Self { g })
    }
}

impl PhaseFunction for HenyeyGreenstein {
    fn p(&self, wo: Vec3f, wi: Vec3f) -> Float {
        phase_hg(wo.dot(wi), self.g)
    }

    fn sample_p(&self, wo: Vec3f, u: Point2f) -> (Vec3f, Float) {
        let g = self.g;
        // cos_theta is measured from the propagation direction -wo
        let cos_theta = if g.abs() < 1.0e-3 {
            1.0 - 2.0 * u[0]
        } else {
            let sqr_term = (1.0 - g * g) / (1.0 - g + 2.0 * g * u[0]);
            (1.0 + g * g - sqr_term * sqr_term) / (2.0 * g)
        };
        let cos_theta = cos_theta.clamp(-1.0, 1.0);

        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = 2.0 * PI * u[1];
        let (v1, v2) = coordinate_system(-wo);
        let wi = spherical_direction_in(sin_theta, cos_theta, phi, v1, v2, -wo);
        (wi, phase_hg(-cos_theta, g))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MediumInteraction {
    pub hit: SurfaceHit,
    pub wo: Vec3f,
    /// Parametric distance along the sampled ray
    pub t: Float,
}

pub struct MediumSample {
    /// Throughput weight of the sample, with the transmittance already accounted for
    pub weight: Spectrum,
    /// Present when a real scattering event was sampled before the end of the ray segment
    pub interaction: Option<MediumInteraction>,
}

/// A participating medium filling the space on one side of a surface.
///
/// Rays handed to a medium are segments inside it, from `t_min` to `t_max`. The direction need
/// not be normalized.
pub trait Medium: Send + Sync {
    /// Beam transmittance along the ray segment.
    fn tr(&self, ray: &Ray) -> Spectrum;

    /// Transmittance due to absorption alone, ignoring out-scattering.
    fn absorption(&self, ray: &Ray) -> Spectrum;

    fn sample(&self, ray: &Ray, sampler: &mut dyn Sampler) -> MediumSample;

    fn phase(&self) -> HenyeyGreenstein;

    /// Number of consecutive scattering events after which only absorption is applied.
    fn max_scattering_count(&self) -> u32;
}

pub type MediumRef = Arc<dyn Medium>;

/// The media on the two sides of a surface. `inside` is the side opposite the geometric normal.
#[derive(Clone, Default)]
pub struct MediumInterface {
    pub inside: Option<MediumRef>,
    pub outside: Option<MediumRef>,
}

impl MediumInterface {
    pub fn new(inside: Option<MediumRef>, outside: Option<MediumRef>) -> Self {
        Self { inside, outside }
    }

    /// The same medium on both sides.
    pub fn uniform(medium: Option<MediumRef>) -> Self {
        Self { inside: medium.clone(), outside: medium }
    }

    pub fn is_transition(&self) -> bool {
        match (&self.inside, &self.outside) {
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            (None, None) => false,
            _ => true,
        }
    }
}

impl std::fmt::Debug for MediumInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediumInterface")
            .field("inside", &self.inside.is_some())
            .field("outside", &self.outside.is_some())
            .finish()
    }
}

/// A medium with constant coefficients.
#[derive(Clone, Debug)]
pub struct HomogeneousMedium {
    sigma_a: Spectrum,
    sigma_s: Spectrum,
    sigma_t: Spectrum,
    phase: HenyeyGreenstein,
    max_scattering_count: u32,
}

fn check_coefficient(what: &'static str, s: Spectrum) -> Result<Spectrum, Error> {
    if !s.is_finite() || s.has_negative() {
        return Err(Error::InvalidParameter { what, reason: format!("{:?} must be finite and non-negative", s) });
    }
    Ok(s)
}

impl HomogeneousMedium {
    pub fn new(sigma_a: Spectrum, sigma_s: Spectrum, g: Float) -> Result<Self, Error> {
        let sigma_a = check_coefficient("absorption coefficient", sigma_a)?;
        let sigma_s = check_coefficient("scattering coefficient", sigma_s)?;
        Ok(Self {
            sigma_a,
            sigma_s,
            sigma_t: sigma_a + sigma_s,
            phase: HenyeyGreenstein::new(g)?,
            max_scattering_count: u32::MAX,
        })
    }

    pub fn with_max_scattering_count(self, max_scattering_count: u32) -> Self {
        Self { max_scattering_count, ..self }
    }

    fn segment_length(ray: &Ray) -> Float {
        ((ray.t_max - ray.t_min) * ray.dir.magnitude()).min(Float::MAX)
    }
}

impl Medium for HomogeneousMedium {
    fn tr(&self, ray: &Ray) -> Spectrum {
        (-self.sigma_t * Self::segment_length(ray)).exp()
    }

    fn absorption(&self, ray: &Ray) -> Spectrum {
        (-self.sigma_a * Self::segment_length(ray)).exp()
    }

    fn sample(&self, ray: &Ray, sampler: &mut dyn Sampler) -> MediumSample {
        let u_channel = sampler.get_1d();
        let u_dist = sampler.get_1d();
        if self.sigma_s.is_black() {
            return MediumSample { weight: self.tr(ray), interaction: None };
        }

        // pick a color channel uniformly and sample a distance proportional to its transmittance
        let n = 3;
        let channel = ((u_channel * n as Float) as usize).min(n - 1);
        let dir_len = ray.dir.magnitude();
        let dist = -(1.0 - u_dist).ln() / self.sigma_t[channel];
        let t = (ray.t_min + dist / dir_len).min(ray.t_max);
        let sampled_medium = t < ray.t_max;

        let tr = (-self.sigma_t * ((t - ray.t_min) * dir_len).min(Float::MAX)).exp();
        let density = if sampled_medium { self.sigma_t * tr } else { tr };
        let pdf = density.average();
        if !(pdf > 0.0) {
            return MediumSample { weight: Spectrum::zero(), interaction: None };
        }

        if sampled_medium {
            let hit = SurfaceHit::at_point(ray.at(t), ray.time);
            MediumSample {
                weight: tr * self.sigma_s / pdf,
                interaction: Some(MediumInteraction { hit, wo: -ray.dir.normalize(), t }),
            }
        } else {
            MediumSample { weight: tr / pdf, interaction: None }
        }
    }

    fn phase(&self) -> HenyeyGreenstein {
        self.phase
    }

    fn max_scattering_count(&self) -> u32 {
        self.max_scattering_count
    }
}
