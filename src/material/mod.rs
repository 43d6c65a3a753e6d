use crate::interaction::SurfaceInteraction;
use crate::reflection::Bsdf;
use crate::spectrum::Spectrum;
use crate::{Float, Error};
use bumpalo::Bump;

pub mod matte;
pub mod mirror;
pub mod glass;
pub mod metal;
pub mod plastic;

pub use matte::MatteMaterial;
pub use mirror::MirrorMaterial;
pub use glass::GlassMaterial;
pub use metal::{MetalMaterial, RoughnessTex};
pub use plastic::PlasticMaterial;

/// Whether a path carries radiance from lights (traced from the camera) or importance from the
/// camera (traced from lights). Refraction scales the two differently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportMode {
    Radiance,
    Importance,
}

pub trait Material: Send + Sync {
    /// Build the BSDF at the interaction. Lobes are allocated in `arena`, which outlives the
    /// returned `Bsdf`.
    fn compute_scattering_functions<'a>(
        &self,
        si: &SurfaceInteraction,
        arena: &'a Bump,
        mode: TransportMode,
    ) -> Bsdf<'a>;
}

pub(crate) fn check_reflectance(what: &'static str, s: Spectrum) -> Result<Spectrum, Error> {
    if !s.is_finite() || s.has_negative() {
        return Err(Error::InvalidParameter { what, reason: format!("{:?} must be finite and non-negative", s) });
    }
    Ok(s)
}

pub(crate) fn check_non_negative(what: &'static str, v: Float) -> Result<Float, Error> {
    if !(v.is_finite() && v >= 0.0) {
        return Err(Error::InvalidParameter { what, reason: format!("{} must be finite and non-negative", v) });
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::BxDFType;
    use crate::shapes::{Shape, Sphere};
    use crate::Ray;
    use cgmath::InnerSpace;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256Plus;

    fn hit_sphere() -> anyhow::Result<SurfaceInteraction> {
        let sphere = Sphere::at(point3f!(0, 0, 0), 1.0)?;
        let ray = Ray::new(point3f!(0.2, 0.1, -3.0), vec3f!(0, 0, 1));
        let (_, si) = sphere.intersect(&ray).ok_or_else(|| anyhow::anyhow!("missed"))?;
        Ok(si)
    }

    /// Monte Carlo estimate of the directional albedo in the direction `si.wo`.
    fn albedo(material: &dyn Material, si: &SurfaceInteraction) -> Spectrum {
        let mut arena = Bump::new();
        let mut rng = Xoshiro256Plus::seed_from_u64(31);
        let n = 20000;
        let mut sum = Spectrum::zero();
        for _ in 0..n {
            {
                let bsdf = material.compute_scattering_functions(si, &arena, TransportMode::Radiance);
                let u = crate::Point2f::new(rng.gen(), rng.gen());
                if let Some(s) = bsdf.sample_f(si.wo, u, BxDFType::ALL) {
                    sum += s.f * s.wi.dot(bsdf.shading_normal()).abs() / s.pdf;
                }
            }
            arena.reset();
        }
        sum / n as Float
    }

    #[test]
    fn test_matte_albedo() -> anyhow::Result<()> {
        let si = hit_sphere()?;
        let a = albedo(&MatteMaterial::constant(Spectrum::uniform(0.5), 0.0)?, &si);
        approx::assert_abs_diff_eq!(a[0], 0.5, epsilon = 1.0e-3);
        let rough = albedo(&MatteMaterial::constant(Spectrum::uniform(0.5), 30.0)?, &si);
        assert!(rough[0] > 0.3 && rough[0] <= 0.55, "{:?}", rough);
        Ok(())
    }

    #[test]
    fn test_mirror_and_glass_conserve_energy() -> anyhow::Result<()> {
        let si = hit_sphere()?;
        let mirror = albedo(&MirrorMaterial::constant(Spectrum::uniform(0.8))?, &si);
        approx::assert_abs_diff_eq!(mirror[0], 0.8, epsilon = 1.0e-4);

        // refraction into the denser side compresses radiance by 1 / eta^2
        let glass = GlassMaterial::constant(Spectrum::uniform(1.0), Spectrum::uniform(1.0), 1.5)?;
        let a = albedo(&glass, &si);
        assert!(a[0] > 0.4 && a[0] < 1.0, "{:?}", a);
        Ok(())
    }

    #[test]
    fn test_rough_materials_stay_below_one() -> anyhow::Result<()> {
        let si = hit_sphere()?;
        let metal = MetalMaterial::constant(Spectrum::rgb(0.2, 0.9, 1.1), Spectrum::rgb(3.9, 2.4, 2.2), 0.3)?;
        let plastic = PlasticMaterial::constant(Spectrum::uniform(0.4), Spectrum::uniform(0.3), 0.2)?;
        for m in [&metal as &dyn Material, &plastic] {
            let a = albedo(m, &si);
            for c in 0..3 {
                assert!(a[c] > 0.0 && a[c] < 1.02, "{:?}", a);
            }
        }
        Ok(())
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(MatteMaterial::constant(Spectrum::uniform(-0.1), 0.0).is_err());
        assert!(GlassMaterial::constant(Spectrum::uniform(1.0), Spectrum::uniform(1.0), 0.0).is_err());
        assert!(MetalMaterial::constant(Spectrum::uniform(1.0), Spectrum::uniform(1.0), Float::NAN).is_err());
    }
}
