use crate::texture::{TextureRef, constant};
use crate::spectrum::Spectrum;
use crate::material::{Material, TransportMode, check_reflectance};
use crate::reflection::{Bsdf, FresnelSpecular, MicrofacetReflection, MicrofacetTransmission, SpecularReflection, SpecularTransmission};
use crate::reflection::microfacet::TrowbridgeReitzDistribution;
use crate::fresnel::FresnelDielectric;
use crate::{Float, SurfaceInteraction, Error};
use bumpalo::Bump;

/// A dielectric boundary. Smooth glass is a single specular lobe choosing between reflection and
/// refraction by the Fresnel term, rough glass uses microfacet lobes.
pub struct GlassMaterial {
    reflectance: TextureRef<Spectrum>,
    transmittance: TextureRef<Spectrum>,
    u_roughness: TextureRef<Float>,
    v_roughness: TextureRef<Float>,
    eta: TextureRef<Float>,
    remap_roughness: bool,
}

impl GlassMaterial {
    pub fn new(
        kr: TextureRef<Spectrum>,
        kt: TextureRef<Spectrum>,
        u_roughness: TextureRef<Float>,
        v_roughness: TextureRef<Float>,
        eta: TextureRef<Float>,
        remap_roughness: bool
    ) -> Self {
        Self {
            reflectance: kr,
            transmittance: kt,
            u_roughness,
            v_roughness,
            eta,
            remap_roughness,
        }
    }

    /// Smooth glass with a constant index of refraction.
    pub fn constant(kr: Spectrum, kt: Spectrum, eta: Float) -> Result<Self, Error> {
        Self::rough(kr, kt, 0.0, eta)
    }

    /// Glass with isotropic roughness given as microfacet alpha.
    pub fn rough(kr: Spectrum, kt: Spectrum, roughness: Float, eta: Float) -> Result<Self, Error> {
        let kr = check_reflectance("glass reflectance", kr)?;
        let kt = check_reflectance("glass transmittance", kt)?;
        if !(eta.is_finite() && eta > 0.0) {
            return Err(Error::InvalidParameter { what: "index of refraction", reason: format!("{} must be positive", eta) });
        }
        if !(roughness.is_finite() && roughness >= 0.0) {
            return Err(Error::InvalidParameter { what: "glass roughness", reason: format!("{} must be non-negative", roughness) });
        }
        Ok(Self::new(constant(kr), constant(kt), constant(roughness), constant(roughness), constant(eta), false))
    }
}

impl Material for GlassMaterial {
    fn compute_scattering_functions<'a>(&self, si: &SurfaceInteraction, arena: &'a Bump, mode: TransportMode) -> Bsdf<'a> {
        let eta = self.eta.evaluate(si.uv);
        let r = self.reflectance.evaluate(si.uv).clamp_positive();
        let t = self.transmittance.evaluate(si.uv).clamp_positive();
        let mut u_rough = self.u_roughness.evaluate(si.uv).max(0.0);
        let mut v_rough = self.v_roughness.evaluate(si.uv).max(0.0);
        if self.remap_roughness {
            u_rough = TrowbridgeReitzDistribution::roughness_to_alpha(u_rough);
            v_rough = TrowbridgeReitzDistribution::roughness_to_alpha(v_rough);
        }
        let mut bsdf = Bsdf::new(si, eta);
        if r.is_black() && t.is_black() {
            return bsdf;
        }

        let is_specular = u_rough == 0.0 && v_rough == 0.0;

        if is_specular {
            if !r.is_black() && !t.is_black() {
                bsdf.add(arena.alloc(FresnelSpecular::new(r, t, 1.0, eta, mode)));
            } else if !r.is_black() {
                bsdf.add(arena.alloc(SpecularReflection::new(r, FresnelDielectric::new(1.0, eta))));
            } else {
                bsdf.add(arena.alloc(SpecularTransmission::new(t, 1.0, eta, mode)));
            }
        } else {
            let distribution = TrowbridgeReitzDistribution::new(u_rough, v_rough);
            if !r.is_black() {
                let fresnel = FresnelDielectric::new(1.0, eta);
                bsdf.add(arena.alloc(MicrofacetReflection::new(r, distribution, fresnel)));
            }
            if !t.is_black() {
                bsdf.add(arena.alloc(MicrofacetTransmission::new(t, distribution, 1.0, eta, mode)));
            }
        }
        bsdf
    }
}
