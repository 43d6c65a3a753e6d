use bitflags::bitflags;
use crate::{Vec3f, Point2f, Float, Normal3, faceforward, abs_dot};
use crate::spectrum::Spectrum;
use crate::fresnel::{Fresnel, FresnelDielectric, fresnel_dielectric};
use crate::material::TransportMode;
use crate::sampling::cosine_sample_hemisphere;
use crate::consts::FRAC_1_PI;
use crate::reflection::microfacet::{MicrofacetDistribution, TrowbridgeReitzDistribution};
use cgmath::{InnerSpace, Rad};

pub mod bsdf;
pub mod microfacet;

pub use bsdf::Bsdf;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BxDFType: u8 {
        const REFLECTION = 1;
        const TRANSMISSION = 1 << 1;
        const DIFFUSE = 1 << 2;
        const GLOSSY = 1 << 3;
        const SPECULAR = 1 << 4;
        const ALL = Self::REFLECTION.bits() | Self::TRANSMISSION.bits() | Self::DIFFUSE.bits()
            | Self::GLOSSY.bits() | Self::SPECULAR.bits();
    }
}

// Trigonometry in the shading frame, where the normal is +z.
pub(crate) fn cos_theta(w: Vec3f) -> Float { w.z }
pub(crate) fn cos2_theta(w: Vec3f) -> Float { w.z * w.z }
pub(crate) fn abs_cos_theta(w: Vec3f) -> Float { w.z.abs() }

pub(crate) fn sin2_theta(w: Vec3f) -> Float {
    Float::max(0.0, 1.0 - cos2_theta(w))
}

pub(crate) fn sin_theta(w: Vec3f) -> Float {
    sin2_theta(w).sqrt()
}

pub(crate) fn tan_theta(w: Vec3f) -> Float {
    sin_theta(w) / cos_theta(w)
}

pub(crate) fn tan2_theta(w: Vec3f) -> Float {
    sin2_theta(w) / cos2_theta(w)
}

pub(crate) fn cos_phi(w: Vec3f) -> Float {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 {
        1.0
    } else {
        (w.x / sin_theta).clamp(-1.0, 1.0)
    }
}

pub(crate) fn sin_phi(w: Vec3f) -> Float {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 {
        0.0
    } else {
        (w.y / sin_theta).clamp(-1.0, 1.0)
    }
}

pub(crate) fn cos2_phi(w: Vec3f) -> Float {
    cos_phi(w) * cos_phi(w)
}

pub(crate) fn sin2_phi(w: Vec3f) -> Float {
    sin_phi(w) * sin_phi(w)
}

/// Refract `wi` through a boundary with normal `n` on the side of `wi`, where `eta` is the ratio
/// of the incident to the transmitted index. `None` on total internal reflection.
pub fn refract(wi: Vec3f, n: Normal3, eta: Float) -> Option<Vec3f> {
    let cos_theta_i = n.dot(wi);
    let sin2_theta_i = Float::max(0.0, 1.0 - cos_theta_i * cos_theta_i);
    let sin2_theta_t = eta * eta * sin2_theta_i;
    if sin2_theta_t >= 1.0 { return None }
    let cos_theta_t = Float::sqrt(1.0 - sin2_theta_t);
    let wt = eta * -wi + (eta * cos_theta_i - cos_theta_t) * n.0;
    Some(wt)
}

pub fn reflect(wo: Vec3f, n: Vec3f) -> Vec3f {
    -wo + 2.0 * wo.dot(n) * n
}

pub fn same_hemisphere(v1: Vec3f, v2: Vec3f) -> bool {
    v1.z * v2.z > 0.0
}

#[derive(Clone, Copy, Debug)]
pub struct ScatterSample {
    pub f: Spectrum,
    pub wi: Vec3f,
    pub pdf: Float,
    pub sampled_type: BxDFType
}

impl ScatterSample {
    /// Whether the sample came from a lobe that is a delta distribution, whose pdf is not a
    /// density and must not enter multiple importance sampling.
    pub fn is_delta(&self) -> bool {
        self.sampled_type.contains(BxDFType::SPECULAR)
    }
}

/// A single scattering lobe. All directions are in the local shading frame and point away from
/// the surface.
pub trait BxDF: Send + Sync {
    fn get_type(&self) -> BxDFType;

    fn matches_flags(&self, t: BxDFType) -> bool {
        t.contains(self.get_type())
    }

    /// Returns the value of the distribution function for the given pair of directions.
    fn f(&self, wo: Vec3f, wi: Vec3f) -> Spectrum;

    /// Sample an incident direction for the outgoing direction `wo`. By default directions are
    /// cosine distributed in the hemisphere of `wo`.
    fn sample_f(&self, wo: Vec3f, sample: Point2f) -> Option<ScatterSample> {
        let mut wi = cosine_sample_hemisphere(sample);
        // flip direction if wo is on the opposite hemisphere
        if wo.z < 0.0 { wi.z *= -1.0; }
        let pdf = self.pdf(wo, wi);
        if pdf == 0.0 {
            return None;
        }
        Some(ScatterSample { f: self.f(wo, wi), wi, pdf, sampled_type: self.get_type() })
    }

    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        if same_hemisphere(wo, wi) {
            abs_cos_theta(wi) * FRAC_1_PI
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LambertianReflection {
    pub r: Spectrum,
}

impl BxDF for LambertianReflection {
    fn get_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::DIFFUSE
    }

    fn f(&self, wo: Vec3f, wi: Vec3f) -> Spectrum {
        if same_hemisphere(wo, wi) { self.r * FRAC_1_PI } else { Spectrum::zero() }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SpecularReflection<F: Fresnel> {
    r: Spectrum,
    fresnel: F
}

impl<F: Fresnel> SpecularReflection<F> {
    pub fn new(r: Spectrum, fresnel: F) -> Self {
        Self {r, fresnel}
    }
}

impl<F: Fresnel> BxDF for SpecularReflection<F> {
    fn get_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::SPECULAR
    }

    fn f(&self, _wo: Vec3f, _wi: Vec3f) -> Spectrum {
        Spectrum::zero()
    }

    fn sample_f(&self, wo: Vec3f, _sample: Point2f) -> Option<ScatterSample> {
        let wi = Vec3f::new(-wo.x, -wo.y, wo.z);
        if cos_theta(wi) == 0.0 {
            return None;
        }
        let reflected = self.fresnel.evaluate(cos_theta(wi)) * self.r / abs_cos_theta(wi);
        Some(ScatterSample { f: reflected, wi, pdf: 1.0, sampled_type: self.get_type() })
    }

    fn pdf(&self, _wo: Vec3f, _wi: Vec3f) -> Float {
        0.0
    }
}

/// Scale for radiance crossing into a medium of different index, which gets compressed into a
/// smaller or larger cone of directions.
fn transmission_scale(mode: TransportMode, eta_i: Float, eta_t: Float) -> Float {
    match mode {
        TransportMode::Radiance => (eta_i * eta_i) / (eta_t * eta_t),
        TransportMode::Importance => 1.0,
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SpecularTransmission {
    t: Spectrum,
    eta_a: Float,
    eta_b: Float,
    fresnel: FresnelDielectric,
    mode: TransportMode,
}

impl SpecularTransmission {
    /// `eta_a` is the index above the surface (the side of the normal), `eta_b` below it.
    pub fn new(t: Spectrum, eta_a: Float, eta_b: Float, mode: TransportMode) -> Self {
        Self {
            t, eta_a, eta_b, mode, fresnel: FresnelDielectric::new(eta_a, eta_b)
        }
    }
}

impl BxDF for SpecularTransmission {
    fn get_type(&self) -> BxDFType {
        BxDFType::TRANSMISSION | BxDFType::SPECULAR
    }

    fn f(&self, _wo: Vec3f, _wi: Vec3f) -> Spectrum {
        Spectrum::zero()
    }

    fn sample_f(&self, wo: Vec3f, _sample: Point2f) -> Option<ScatterSample> {
        let entering = cos_theta(wo) > 0.0;
        let (eta_i, eta_t) = if entering { (self.eta_a, self.eta_b) } else { (self.eta_b, self.eta_a) };

        let wi = refract(
            wo,
            Normal3::new(0.0, 0.0, 1.0).faceforward(wo),
            eta_i / eta_t
        )?;
        if cos_theta(wi) == 0.0 {
            return None;
        }

        let ft = self.t * (Spectrum::uniform(1.0) - self.fresnel.evaluate(cos_theta(wi)))
            * transmission_scale(self.mode, eta_i, eta_t);
        Some(ScatterSample {
            f: ft / abs_cos_theta(wi),
            wi,
            pdf: 1.0,
            sampled_type: self.get_type()
        })
    }

    fn pdf(&self, _wo: Vec3f, _wi: Vec3f) -> Float {
        0.0
    }
}

/// Specular reflection and transmission in one lobe, choosing between them by the Fresnel
/// reflectance.
#[derive(Clone, Copy, Debug)]
pub struct FresnelSpecular {
    r: Spectrum,
    t: Spectrum,
    eta_a: Float,
    eta_b: Float,
    mode: TransportMode,
}

impl FresnelSpecular {
    pub fn new(r: Spectrum, t: Spectrum, eta_a: Float, eta_b: Float, mode: TransportMode) -> Self {
        Self { r, t, eta_a, eta_b, mode }
    }
}

impl BxDF for FresnelSpecular {
    fn get_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::TRANSMISSION | BxDFType::SPECULAR
    }

    fn f(&self, _wo: Vec3f, _wi: Vec3f) -> Spectrum {
        Spectrum::zero()
    }

    fn sample_f(&self, wo: Vec3f, u: Point2f) -> Option<ScatterSample> {
        let fr = fresnel_dielectric(cos_theta(wo), self.eta_a, self.eta_b);
        if u[0] < fr {
            let wi = Vec3f::new(-wo.x, -wo.y, wo.z);
            if cos_theta(wi) == 0.0 {
                return None;
            }
            Some(ScatterSample {
                f: fr * self.r / abs_cos_theta(wi),
                wi,
                pdf: fr,
                sampled_type: BxDFType::REFLECTION | BxDFType::SPECULAR,
            })
        } else {
            let entering = cos_theta(wo) > 0.0;
            let (eta_i, eta_t) = if entering { (self.eta_a, self.eta_b) } else { (self.eta_b, self.eta_a) };
            let wi = refract(wo, Normal3::new(0.0, 0.0, 1.0).faceforward(wo), eta_i / eta_t)?;
            if cos_theta(wi) == 0.0 {
                return None;
            }
            let ft = self.t * (1.0 - fr) * transmission_scale(self.mode, eta_i, eta_t);
            Some(ScatterSample {
                f: ft / abs_cos_theta(wi),
                wi,
                pdf: 1.0 - fr,
                sampled_type: BxDFType::TRANSMISSION | BxDFType::SPECULAR,
            })
        }
    }

    fn pdf(&self, _wo: Vec3f, _wi: Vec3f) -> Float {
        0.0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OrenNayar {
    pub r: Spectrum,
    pub a: Float,
    pub b: Float,
}

impl OrenNayar {
    /// `sigma` is the standard deviation of the microfacet orientation angle.
    pub fn new(r: Spectrum, sigma: impl Into<Rad<Float>>) -> Self {
        let sigma = sigma.into().0;
        let sigma2 = sigma * sigma;
        let a = 1.0 - (sigma2 / (2.0 * (sigma2 + 0.33)));
        let b = 0.45 * sigma2 / (sigma2 + 0.09);
        OrenNayar { r, a, b }
    }
}

impl BxDF for OrenNayar {
    fn get_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::DIFFUSE
    }

    fn f(&self, wo: Vec3f, wi: Vec3f) -> Spectrum {
        if !same_hemisphere(wo, wi) {
            return Spectrum::zero();
        }
        let sin_theta_i = sin_theta(wi);
        let sin_theta_o = sin_theta(wo);
        // compute cosine term of Oren-Nayar model
        let max_cos = if sin_theta_i > 1.0e-4 && sin_theta_o > 1.0e-4 {
            let d_cos = cos_phi(wi) * cos_phi(wo) + sin_phi(wi) * sin_phi(wo);
            Float::max(0.0, d_cos)
        } else {
            0.0
        };

        let (sin_alpha, tan_beta) = if abs_cos_theta(wi) > abs_cos_theta(wo) {
            (sin_theta_o, sin_theta_i / abs_cos_theta(wi))
        } else {
            (sin_theta_i, sin_theta_o / abs_cos_theta(wo))
        };

        self.r * FRAC_1_PI * (self.a + (self.b * max_cos * sin_alpha * tan_beta))
    }
}

/// A general microfacet-based BRDF using the Torrance-Sparrow model.
#[derive(Clone, Copy, Debug)]
pub struct MicrofacetReflection<F: Fresnel> {
    pub r: Spectrum,
    pub distribution: TrowbridgeReitzDistribution,
    pub fresnel: F,
}

impl<F: Fresnel> MicrofacetReflection<F> {
    pub fn new(r: Spectrum, distribution: TrowbridgeReitzDistribution, fresnel: F) -> Self {
        MicrofacetReflection { r, distribution, fresnel }
    }
}

impl<F: Fresnel> BxDF for MicrofacetReflection<F> {
    fn get_type(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::GLOSSY
    }

    fn f(&self, wo: Vec3f, wi: Vec3f) -> Spectrum {
        if !same_hemisphere(wo, wi) {
            return Spectrum::zero();
        }
        let cos_theta_o = abs_cos_theta(wo);
        let cos_theta_i = abs_cos_theta(wi);
        let wh = wi + wo;

        // handle degenerate cases
        if cos_theta_i == 0.0 || cos_theta_o == 0.0 || wh.magnitude2() == 0.0 {
            return Spectrum::zero()
        }
        let wh = wh.normalize();

        // For the Fresnel call, make sure that wh is in the same hemisphere as the surface
        // normal so total internal reflection is handled correctly.
        let f = self.fresnel.evaluate(
            wi.dot(faceforward(wh, Vec3f::new(0.0, 0.0, 1.0))));

        self.r * self.distribution.d(wh) * self.distribution.g(wo, wi) * f
            / (4.0 * cos_theta_i * cos_theta_o)
    }

    fn sample_f(&self, wo: Vec3f, sample: Point2f) -> Option<ScatterSample> {
        if wo.z == 0.0 {
            return None;
        }
        let wh = self.distribution.sample_wh(wo, sample);
        if wo.dot(wh) <= 0.0 {
            return None;
        }
        let wi = reflect(wo, wh);
        if !same_hemisphere(wo, wi) {
            return None;
        }

        let pdf = self.distribution.pdf(wo, wh) / (4.0 * wo.dot(wh));
        ScatterSample {
            f: self.f(wo, wi),
            wi,
            pdf,
            sampled_type: self.get_type()
        }.into()
    }

    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        if !same_hemisphere(wo, wi) {
            return 0.0
        }
        let wh = wo + wi;
        if wh.magnitude2() == 0.0 {
            return 0.0;
        }
        let wh = wh.normalize();
        self.distribution.pdf(wo, wh) / (4.0 * wo.dot(wh).abs())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MicrofacetTransmission {
    pub t: Spectrum,
    pub distribution: TrowbridgeReitzDistribution,
    pub eta_a: Float,
    pub eta_b: Float,
    pub fresnel: FresnelDielectric,
    pub mode: TransportMode,
}

impl MicrofacetTransmission {
    pub fn new(t: Spectrum, distribution: TrowbridgeReitzDistribution, eta_a: Float, eta_b: Float, mode: TransportMode) -> Self {
        MicrofacetTransmission { t, distribution, eta_a, eta_b, fresnel: FresnelDielectric::new(eta_a, eta_b), mode }
    }

    /// Ratio of the transmitted to the incident index for light leaving along `wo`.
    fn get_eta(&self, wo: Vec3f) -> Float {
        if cos_theta(wo) > 0.0 { self.eta_b / self.eta_a } else { self.eta_a / self.eta_b }
    }

    /// The half vector of a refraction pair, oriented along +z.
    fn half_vector(&self, wo: Vec3f, wi: Vec3f) -> Option<(Vec3f, Float)> {
        let eta = self.get_eta(wo);
        let wh = wo + wi * eta;
        if wh.magnitude2() == 0.0 {
            return None;
        }
        let wh = wh.normalize();
        let wh = if wh.z < 0.0 { -wh } else { wh };
        // both directions must lie on opposite sides of the microfacet
        if wo.dot(wh) * wi.dot(wh) > 0.0 {
            return None;
        }
        Some((wh, eta))
    }
}

impl BxDF for MicrofacetTransmission {
    fn get_type(&self) -> BxDFType {
        BxDFType::TRANSMISSION | BxDFType::GLOSSY
    }

    fn f(&self, wo: Vec3f, wi: Vec3f) -> Spectrum {
        if same_hemisphere(wo, wi) {
            return Spectrum::zero();
        }
        let cos_theta_o = cos_theta(wo);
        let cos_theta_i = cos_theta(wi);
        if cos_theta_o == 0.0 || cos_theta_i == 0.0 {
            return Spectrum::zero();
        }

        let (wh, eta) = match self.half_vector(wo, wi) {
            Some(h) => h,
            None => return Spectrum::zero(),
        };
        let f = self.fresnel.evaluate(wo.dot(wh));
        let sqrt_denom = wo.dot(wh) + eta * wi.dot(wh);
        let factor = match self.mode {
            TransportMode::Radiance => 1.0 / eta,
            TransportMode::Importance => 1.0,
        };
        (Spectrum::uniform(1.0) - f) * self.t *
            Float::abs(self.distribution.d(wh) * self.distribution.g(wo, wi) * sq!(eta) * abs_dot(wi, wh) * abs_dot(wo, wh) * sq!(factor)
            / (cos_theta_i * cos_theta_o * sq!(sqrt_denom)))
    }

    fn sample_f(&self, wo: Vec3f, sample: Point2f) -> Option<ScatterSample> {
        if wo.z == 0.0 {
            return None;
        }
        let wh = self.distribution.sample_wh(wo, sample);
        if wo.dot(wh) <= 0.0 {
            return None;
        }
        // refract takes the incident over transmitted ratio, the inverse of get_eta
        let eta = 1.0 / self.get_eta(wo);
        let wi = refract(wo, Normal3(wh), eta)?;
        let pdf = self.pdf(wo, wi);
        if pdf == 0.0 {
            return None;
        }
        ScatterSample {
            f: self.f(wo, wi),
            wi,
            pdf,
            sampled_type: self.get_type()
        }.into()
    }

    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        if same_hemisphere(wo, wi) {
            return 0.0
        }
        let (wh, eta) = match self.half_vector(wo, wi) {
            Some(h) => h,
            None => return 0.0,
        };
        let sqrt_denom = wo.dot(wh) + eta * wi.dot(wh);
        let dwh_dwi = Float::abs((sq!(eta) * wi.dot(wh)) / sq!(sqrt_denom));
        self.distribution.pdf(wo, wh) * dwh_dwi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PI;
    use crate::sampling::uniform_sample_sphere;
    use crate::fresnel::FresnelNoOp;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256Plus;

    fn rand_point(rng: &mut Xoshiro256Plus) -> Point2f {
        Point2f::new(rng.gen(), rng.gen())
    }

    /// Monte Carlo estimate of the integral of the pdf over the sphere.
    fn integrate_pdf(bxdf: &dyn BxDF, wo: Vec3f, n: usize) -> Float {
        let mut rng = Xoshiro256Plus::seed_from_u64(17);
        let sum: f64 = (0..n).map(|_| {
            let wi = uniform_sample_sphere(rand_point(&mut rng));
            (bxdf.pdf(wo, wi) * 4.0 * PI) as f64
        }).sum();
        (sum / n as f64) as Float
    }

    fn check_sample_consistency(bxdf: &dyn BxDF, wo: Vec3f) {
        let mut rng = Xoshiro256Plus::seed_from_u64(5);
        for _ in 0..1000 {
            if let Some(s) = bxdf.sample_f(wo, rand_point(&mut rng)) {
                assert_relative_eq!(s.pdf, bxdf.pdf(wo, s.wi), max_relative = 1.0e-2, epsilon = 1.0e-4);
                let f = bxdf.f(wo, s.wi);
                for c in 0..3 {
                    assert_relative_eq!(s.f[c], f[c], max_relative = 1.0e-2, epsilon = 1.0e-4);
                }
            }
        }
    }

    fn check_zero_f_where_zero_pdf(bxdf: &dyn BxDF, wo: Vec3f) {
        let mut rng = Xoshiro256Plus::seed_from_u64(8);
        for _ in 0..2000 {
            let wi = uniform_sample_sphere(rand_point(&mut rng));
            if bxdf.pdf(wo, wi) == 0.0 {
                assert!(bxdf.f(wo, wi).is_black(), "f != 0 at wi = {:?}", wi);
            }
        }
    }

    #[test]
    fn test_lambertian() {
        let bxdf = LambertianReflection { r: Spectrum::uniform(0.5) };
        let wo = vec3f!(0.3, 0.2, 0.9).normalize();
        assert_abs_diff_eq!(integrate_pdf(&bxdf, wo, 200_000), 1.0, epsilon = 0.02);
        check_sample_consistency(&bxdf, wo);
        check_zero_f_where_zero_pdf(&bxdf, wo);
        assert_abs_diff_eq!(bxdf.f(wo, vec3f!(0, 0, 1))[0], 0.5 * FRAC_1_PI);
    }

    #[test]
    fn test_oren_nayar() {
        let bxdf = OrenNayar::new(Spectrum::uniform(0.8), cgmath::Deg(20.0));
        let wo = vec3f!(-0.5, 0.1, 0.6).normalize();
        assert_abs_diff_eq!(integrate_pdf(&bxdf, wo, 200_000), 1.0, epsilon = 0.02);
        check_sample_consistency(&bxdf, wo);
        check_zero_f_where_zero_pdf(&bxdf, wo);

        // zero roughness is lambertian
        let smooth = OrenNayar::new(Spectrum::uniform(0.8), Rad(0.0));
        assert_abs_diff_eq!(smooth.f(wo, vec3f!(0.2, 0.2, 0.9).normalize())[0], 0.8 * FRAC_1_PI, epsilon = 1.0e-6);
    }

    #[test]
    fn test_microfacet_reflection() {
        let distribution = TrowbridgeReitzDistribution::new(0.3, 0.3);
        let bxdf = MicrofacetReflection::new(Spectrum::uniform(1.0), distribution, FresnelNoOp);
        let wo = vec3f!(0.0, 0.1, 1.0).normalize();
        let integral = integrate_pdf(&bxdf, wo, 400_000);
        // rays reflected below the horizon are lost, so the integral can fall short of one
        assert!(integral < 1.03, "{}", integral);
        assert!(integral > 0.9, "{}", integral);
        check_sample_consistency(&bxdf, wo);
        check_zero_f_where_zero_pdf(&bxdf, wo);
    }

    #[test]
    fn test_microfacet_transmission() {
        let distribution = TrowbridgeReitzDistribution::new(0.4, 0.4);
        let bxdf = MicrofacetTransmission::new(Spectrum::uniform(1.0), distribution, 1.0, 1.5, TransportMode::Radiance);
        for wo in [vec3f!(0.2, 0.0, 1.0).normalize(), vec3f!(0.1, 0.3, -1.0).normalize()] {
            let integral = integrate_pdf(&bxdf, wo, 400_000);
            assert!(integral < 1.05, "{}", integral);
            check_sample_consistency(&bxdf, wo);
            check_zero_f_where_zero_pdf(&bxdf, wo);
        }
    }

    #[test]
    fn test_specular_reflection_is_delta() {
        let bxdf = SpecularReflection::new(Spectrum::uniform(0.9), FresnelNoOp);
        let wo = vec3f!(0.3, -0.2, 0.8).normalize();
        let s = bxdf.sample_f(wo, Point2f::new(0.5, 0.5)).expect("sample");
        assert!(s.is_delta());
        assert_eq!(s.wi, vec3f!(-wo.x, -wo.y, wo.z));
        assert_abs_diff_eq!(s.f[0] * abs_cos_theta(s.wi), 0.9, epsilon = 1.0e-5);
        assert_eq!(bxdf.pdf(wo, s.wi), 0.0);
    }

    #[test]
    fn test_specular_transmission_bends_towards_normal() {
        let bxdf = SpecularTransmission::new(Spectrum::uniform(1.0), 1.0, 1.5, TransportMode::Importance);
        let wo = vec3f!(0.5, 0.0, 0.866).normalize();
        let s = bxdf.sample_f(wo, Point2f::new(0.5, 0.5)).expect("sample");
        assert!(s.wi.z < 0.0);
        // snell's law: sin_t = sin_i / 1.5
        assert_abs_diff_eq!(sin_theta(s.wi), sin_theta(wo) / 1.5, epsilon = 1.0e-4);
        assert!(s.is_delta());
    }

    #[test]
    fn test_fresnel_specular_energy() {
        let bxdf = FresnelSpecular::new(Spectrum::uniform(1.0), Spectrum::uniform(1.0), 1.0, 1.5, TransportMode::Importance);
        let wo = vec3f!(0.4, 0.1, 0.9).normalize();
        let mut rng = Xoshiro256Plus::seed_from_u64(21);
        let n = 10000;
        let mut total = 0.0;
        for _ in 0..n {
            if let Some(s) = bxdf.sample_f(wo, rand_point(&mut rng)) {
                total += s.f[0] * abs_cos_theta(s.wi) / s.pdf;
            }
        }
        // a lossless dielectric reflects or transmits everything
        assert_abs_diff_eq!(total / n as Float, 1.0, epsilon = 1.0e-3);
    }
}
