use crate::texture::{TextureRef, constant};
use crate::spectrum::Spectrum;
use crate::material::{Material, TransportMode, check_reflectance, check_non_negative};
use crate::reflection::{Bsdf, MicrofacetReflection};
use crate::reflection::microfacet::TrowbridgeReitzDistribution;
use crate::fresnel::FresnelConductor;
use crate::{Float, SurfaceInteraction, Error};
use bumpalo::Bump;

pub enum RoughnessTex {
    Anisotropic {
        u_rough: TextureRef<Float>,
        v_rough: TextureRef<Float>,
    },
    Isotropic(TextureRef<Float>)
}

/// A rough conductor.
pub struct MetalMaterial {
    /// Index of refraction
    eta: TextureRef<Spectrum>,

    /// Absorption coefficient
    k: TextureRef<Spectrum>,

    roughness: RoughnessTex,

    remap_roughness: bool,
}

impl MetalMaterial {
    pub fn new(eta: TextureRef<Spectrum>, k: TextureRef<Spectrum>, roughness: RoughnessTex, remap_roughness: bool) -> Self {
        MetalMaterial { eta, k, roughness, remap_roughness }
    }

    /// Constant optical constants and an isotropic roughness in [0, 1] that is remapped to alpha.
    pub fn constant(eta: Spectrum, k: Spectrum, roughness: Float) -> Result<Self, Error> {
        let eta = check_reflectance("metal index of refraction", eta)?;
        let k = check_reflectance("metal absorption", k)?;
        let roughness = check_non_negative("metal roughness", roughness)?;
        Ok(Self::new(constant(eta), constant(k), RoughnessTex::Isotropic(constant(roughness)), true))
    }
}

impl Material for MetalMaterial {
    fn compute_scattering_functions<'a>(&self, si: &SurfaceInteraction, arena: &'a Bump, _mode: TransportMode) -> Bsdf<'a> {
        let (u_rough, v_rough) = match &self.roughness {
            RoughnessTex::Anisotropic { u_rough, v_rough} => {
                (u_rough.evaluate(si.uv), v_rough.evaluate(si.uv))
            },
            RoughnessTex::Isotropic(rough) => {
                let r = rough.evaluate(si.uv);
                (r, r)
            }
        };
        let (u_rough, v_rough) = if self.remap_roughness {
            (TrowbridgeReitzDistribution::roughness_to_alpha(u_rough), TrowbridgeReitzDistribution::roughness_to_alpha(v_rough))
        } else { (u_rough, v_rough) };

        let distribution = TrowbridgeReitzDistribution::new(u_rough, v_rough);
        let fresnel = FresnelConductor::new(
            Spectrum::uniform(1.0),
            self.eta.evaluate(si.uv).clamp_positive(),
            self.k.evaluate(si.uv).clamp_positive(),
        );
        let mut bsdf = Bsdf::new(si, 1.0);
        bsdf.add(arena.alloc(MicrofacetReflection::new(Spectrum::uniform(1.0), distribution, fresnel)));
        bsdf
    }
}
