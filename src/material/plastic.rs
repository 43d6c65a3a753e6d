use crate::texture::{TextureRef, constant};
use crate::spectrum::Spectrum;
use crate::material::{Material, TransportMode, check_reflectance, check_non_negative};
use crate::reflection::{Bsdf, LambertianReflection, MicrofacetReflection};
use crate::reflection::microfacet::TrowbridgeReitzDistribution;
use crate::fresnel::FresnelDielectric;
use crate::{Float, SurfaceInteraction, Error};
use bumpalo::Bump;

/// A diffuse base under a glossy dielectric coat.
pub struct PlasticMaterial {
    kd: TextureRef<Spectrum>,
    ks: TextureRef<Spectrum>,
    roughness: TextureRef<Float>,
    remap_roughness: bool,
}

impl PlasticMaterial {
    pub fn new(kd: TextureRef<Spectrum>, ks: TextureRef<Spectrum>, roughness: TextureRef<Float>, remap_roughness: bool) -> Self {
        PlasticMaterial { kd, ks, roughness, remap_roughness }
    }

    /// `roughness` is in [0, 1] and remapped to alpha.
    pub fn constant(kd: Spectrum, ks: Spectrum, roughness: Float) -> Result<Self, Error> {
        let kd = check_reflectance("plastic diffuse reflectance", kd)?;
        let ks = check_reflectance("plastic specular reflectance", ks)?;
        let roughness = check_non_negative("plastic roughness", roughness)?;
        Ok(Self::new(constant(kd), constant(ks), constant(roughness), true))
    }
}

impl Material for PlasticMaterial {
    fn compute_scattering_functions<'a>(&self, si: &SurfaceInteraction, arena: &'a Bump, _mode: TransportMode) -> Bsdf<'a> {
        let mut bsdf = Bsdf::new(si, 1.0);
        let kd = self.kd.evaluate(si.uv).clamp_positive();
        if !kd.is_black() {
            bsdf.add(arena.alloc(LambertianReflection { r: kd }))
        }

        let ks = self.ks.evaluate(si.uv).clamp_positive();
        if !ks.is_black() {
            let fresnel = FresnelDielectric::new(1.0, 1.5);
            let mut rough = self.roughness.evaluate(si.uv);
            if self.remap_roughness {
                rough = TrowbridgeReitzDistribution::roughness_to_alpha(rough);
            }
            let distribution = TrowbridgeReitzDistribution::new(rough, rough);
            bsdf.add(arena.alloc(MicrofacetReflection::new(ks, distribution, fresnel)))
        }
        bsdf
    }
}
