use bumpalo::Bump;

use crate::{abs_dot, Float, Ray, Vec3f};
use crate::medium::{HenyeyGreenstein, PhaseFunction};
use crate::reflection::{Bsdf, BxDFType};
use crate::sampler::Sampler;
use crate::sampling::{balance_heuristic, power_heuristic};
use crate::scene::Scene;
use crate::settings::MisHeuristic;
use crate::spectrum::Spectrum;

pub mod path;

pub use path::PathIntegrator;

/// Radiance carried along a single camera ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadianceEstimate {
    pub radiance: Spectrum,
    /// Contributions that were dropped for being NaN, infinite or negative
    pub rejected: u32,
}

impl RadianceEstimate {
    pub fn zero() -> Self {
        Self { radiance: Spectrum::zero(), rejected: 0 }
    }

    /// Add `contribution` unless any of its components is non-finite or negative.
    pub fn add(&mut self, contribution: Spectrum) {
        if contribution.is_finite() && !contribution.has_negative() {
            self.radiance += contribution;
        } else {
            self.rejected += 1;
        }
    }
}

pub trait Integrator: Sync + Send {
    /// Estimate the radiance arriving at the ray origin from direction `-ray.dir`. Any
    /// allocation made in `arena` may be dropped as soon as this returns.
    fn incident_radiance(
        &self,
        ray: &Ray,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        arena: &Bump,
    ) -> RadianceEstimate;
}

/// What scatters light at a path vertex.
pub(crate) enum Scatterer<'b> {
    Surface { bsdf: &'b Bsdf<'b>, wo: Vec3f },
    Medium { phase: HenyeyGreenstein, wo: Vec3f },
}

impl<'b> Scatterer<'b> {
    /// Scattered fraction towards `wi` including the cosine term, and the density of sampling `wi`.
    pub(crate) fn eval(&self, wi: Vec3f) -> (Spectrum, Float) {
        match self {
            Scatterer::Surface { bsdf, wo } => {
                let f = bsdf.f(*wo, wi, BxDFType::ALL) * abs_dot(wi, bsdf.shading_normal());
                (f, bsdf.pdf(*wo, wi, BxDFType::ALL))
            }
            Scatterer::Medium { phase, wo } => {
                let p = phase.p(*wo, wi);
                (Spectrum::uniform(p), p)
            }
        }
    }
}

pub(crate) fn mis_weight(heuristic: MisHeuristic, f_pdf: Float, g_pdf: Float) -> Float {
    match heuristic {
        MisHeuristic::Power => power_heuristic(1, f_pdf, 1, g_pdf),
        MisHeuristic::Balance => balance_heuristic(1, f_pdf, 1, g_pdf),
    }
}
