use crate::texture::{TextureRef, constant};
use crate::spectrum::Spectrum;
use crate::material::{Material, TransportMode, check_reflectance};
use crate::reflection::{Bsdf, SpecularReflection};
use crate::fresnel::FresnelNoOp;
use crate::{SurfaceInteraction, Error};
use bumpalo::Bump;

pub struct MirrorMaterial {
    reflectance: TextureRef<Spectrum>,
}

impl MirrorMaterial {
    pub fn new(reflectance: TextureRef<Spectrum>) -> Self {
        Self { reflectance }
    }

    pub fn constant(reflectance: Spectrum) -> Result<Self, Error> {
        Ok(Self::new(constant(check_reflectance("mirror reflectance", reflectance)?)))
    }
}

impl Material for MirrorMaterial {
    fn compute_scattering_functions<'a>(&self, si: &SurfaceInteraction, arena: &'a Bump, _mode: TransportMode) -> Bsdf<'a> {
        let mut bsdf = Bsdf::new(si, 1.0);
        let r = self.reflectance.evaluate(si.uv).clamp_positive();
        if !r.is_black() {
            bsdf.add(arena.alloc(SpecularReflection::new(r, FresnelNoOp)));
        }
        bsdf
    }
}
