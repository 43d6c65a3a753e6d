use crate::texture::{TextureRef, constant};
use crate::spectrum::Spectrum;
use crate::material::{Material, TransportMode, check_reflectance, check_non_negative};
use crate::interaction::SurfaceInteraction;
use crate::reflection::{Bsdf, LambertianReflection, OrenNayar};
use crate::{Float, Error};
use bumpalo::Bump;
use cgmath::Deg;

/// A purely diffuse surface. Lambertian when `sigma` is zero, Oren-Nayar otherwise.
pub struct MatteMaterial {
    diffuse: TextureRef<Spectrum>,
    /// Roughness as the standard deviation of facet slopes, in degrees
    sigma: TextureRef<Float>,
}

impl MatteMaterial {
    pub fn new(diffuse: TextureRef<Spectrum>, sigma: TextureRef<Float>) -> Self {
        Self { diffuse, sigma }
    }

    pub fn constant(diffuse: Spectrum, sigma: Float) -> Result<Self, Error> {
        let diffuse = check_reflectance("matte reflectance", diffuse)?;
        let sigma = check_non_negative("matte roughness", sigma)?;
        Ok(Self::new(constant(diffuse), constant(sigma)))
    }
}

impl Material for MatteMaterial {
    fn compute_scattering_functions<'a>(&self, si: &SurfaceInteraction, arena: &'a Bump, _mode: TransportMode) -> Bsdf<'a> {
        let mut bsdf = Bsdf::new(si, 1.0);

        let r = self.diffuse.evaluate(si.uv).clamp_positive();
        if r.is_black() {
            return bsdf;
        }
        let sigma = self.sigma.evaluate(si.uv).clamp(0.0, 90.0);
        if sigma == 0.0 {
            bsdf.add(arena.alloc(LambertianReflection { r }));
        } else {
            bsdf.add(arena.alloc(OrenNayar::new(r, Deg(sigma))));
        }
        bsdf
    }
}
