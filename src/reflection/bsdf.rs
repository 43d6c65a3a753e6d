use crate::{Float, Vec3f, Point2f, coordinate_system};
use crate::reflection::{BxDF, BxDFType, ScatterSample};
use crate::interaction::SurfaceInteraction;
use crate::spectrum::Spectrum;
use arrayvec::ArrayVec;
use cgmath::InnerSpace;

pub const MAX_BXDFS: usize = 8;

/// The scattering lobes at one surface point together with the shading frame they live in.
/// Lobes are borrowed from the per-sample arena.
pub struct Bsdf<'a> {
    /// Index of refraction over the boundary
    pub eta: Float,

    /// Shading normal
    ns: Vec3f,

    /// Geometry normal
    ng: Vec3f,

    /// s orthonormal basis vector with the shading normal
    ss: Vec3f,

    /// t orthonormal basis vector with the shading normal
    ts: Vec3f,

    bxdfs: ArrayVec<&'a dyn BxDF, MAX_BXDFS>,
}

impl<'a> Bsdf<'a> {
    pub fn new(si: &SurfaceInteraction, eta: Float) -> Self {
        let ns = si.shading_n.0;
        let ng = si.hit.n.0;
        // project dpdu into the tangent plane, it is not orthogonal to ns for interpolated normals
        let dpdu = si.shading_geom.dpdu;
        let tangent = dpdu - ns * ns.dot(dpdu);
        let ss = if tangent.magnitude2() > 1.0e-12 {
            tangent.normalize()
        } else {
            coordinate_system(ns).0
        };
        let ts = ns.cross(ss);

        Self {
            eta,
            ns,
            ng,
            ss,
            ts,
            bxdfs: ArrayVec::new(),
        }
    }

    /// Add a lobe. Lobes beyond the fixed capacity are dropped.
    pub fn add(&mut self, bxdf: &'a dyn BxDF) {
        if self.bxdfs.try_push(bxdf).is_err() {
            tracing::warn!("BSDF lobe limit of {} reached", MAX_BXDFS);
        }
    }

    pub fn num_components(&self, flags: BxDFType) -> usize {
        self.bxdfs.iter().filter(|bxdf| bxdf.matches_flags(flags)).count()
    }

    pub fn world_to_local(&self, v: Vec3f) -> Vec3f {
        Vec3f::new(v.dot(self.ss), v.dot(self.ts), v.dot(self.ns))
    }

    pub fn local_to_world(&self, v: Vec3f) -> Vec3f {
        self.ss * v.x + self.ts * v.y + self.ns * v.z
    }

    pub fn shading_normal(&self) -> Vec3f {
        self.ns
    }

    /// Whether the pair of directions is a reflection with respect to the geometric normal,
    /// which decides if reflection or transmission lobes apply.
    fn is_reflection(&self, wo_world: Vec3f, wi_world: Vec3f) -> bool {
        wi_world.dot(self.ng) * wo_world.dot(self.ng) > 0.0
    }

    fn lobe_applies(bxdf: &dyn BxDF, reflect: bool) -> bool {
        (reflect && bxdf.get_type().contains(BxDFType::REFLECTION))
            || (!reflect && bxdf.get_type().contains(BxDFType::TRANSMISSION))
    }

    pub fn f(&self, wo_world: Vec3f, wi_world: Vec3f, flags: BxDFType) -> Spectrum {
        let wi = self.world_to_local(wi_world);
        let wo = self.world_to_local(wo_world);
        if wo.z == 0.0 { return Spectrum::zero() }

        let reflect = self.is_reflection(wo_world, wi_world);

        self.bxdfs.iter()
            .filter(|bxdf| bxdf.matches_flags(flags) && Self::lobe_applies(**bxdf, reflect))
            .map(|bxdf| bxdf.f(wo, wi))
            .sum()
    }

    /// Density of `sample_f` choosing `wi_world`, averaged over the matching lobes.
    pub fn pdf(&self, wo_world: Vec3f, wi_world: Vec3f, flags: BxDFType) -> Float {
        let wo = self.world_to_local(wo_world);
        let wi = self.world_to_local(wi_world);
        if wo.z == 0.0 { return 0.0 }

        let (sum, count) = self.bxdfs.iter()
            .filter(|bxdf| bxdf.matches_flags(flags))
            .fold((0.0, 0), |(sum, count), bxdf| (sum + bxdf.pdf(wo, wi), count + 1));

        if count > 0 { sum / count as Float } else { 0.0 }
    }

    pub fn sample_f(&self, wo_world: Vec3f, u: Point2f, flags: BxDFType) -> Option<ScatterSample> {
        let matching_comps = self.num_components(flags);
        if matching_comps == 0 { return None }

        // choose which lobe to sample and remap the first dimension for it
        let comp = ((u[0] * matching_comps as Float) as usize).min(matching_comps - 1);
        let bxdf: &dyn BxDF = *self.bxdfs.iter()
            .filter(|bxdf| bxdf.matches_flags(flags))
            .nth(comp)?;

        let u_remapped = Point2f::new(
            (u[0] * matching_comps as Float - comp as Float).min(1.0 - Float::EPSILON),
            u[1]
        );

        let wo = self.world_to_local(wo_world);
        if wo.z == 0.0 { return None }
        let sample = bxdf.sample_f(wo, u_remapped)?;
        if sample.pdf == 0.0 { return None }
        let wi_world = self.local_to_world(sample.wi);

        let mut pdf = sample.pdf;
        let mut f = sample.f;

        // a delta lobe can't be hit by the others, so only its own value counts
        if !sample.is_delta() {
            let reflect = self.is_reflection(wo_world, wi_world);
            f = Spectrum::zero();
            for (i, other) in self.bxdfs.iter().filter(|b| b.matches_flags(flags)).enumerate() {
                if i != comp {
                    pdf += other.pdf(wo, sample.wi);
                }
                if Self::lobe_applies(*other, reflect) {
                    f += other.f(wo, sample.wi);
                }
            }
        }
        if matching_comps > 1 {
            pdf /= matching_comps as Float;
        }

        Some(ScatterSample { f, wi: wi_world, pdf, sampled_type: sample.sampled_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::DiffGeom;
    use crate::reflection::{LambertianReflection, SpecularReflection, MicrofacetReflection};
    use crate::reflection::microfacet::TrowbridgeReitzDistribution;
    use crate::fresnel::{FresnelNoOp, FresnelDielectric};
    use crate::sampling::uniform_sample_sphere;
    use crate::consts::PI;
    use crate::{Normal3, Point3f};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use cgmath::EuclideanSpace;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256Plus;

    fn tilted_interaction() -> SurfaceInteraction {
        let n = Normal3(vec3f!(0.0, 1.0, 1.0).normalize());
        let geom = DiffGeom {
            dpdu: vec3f!(1, 0, 0),
            dpdv: vec3f!(0.0, -1.0, 1.0),
            dndu: Normal3::zero(),
            dndv: Normal3::zero(),
        };
        SurfaceInteraction::new(Point3f::origin(), vec3f!(0, 0, 0), 0.0, Point2f::new(0.0, 0.0), n.0, n, geom)
    }

    #[test]
    fn test_frame_round_trip() {
        let si = tilted_interaction();
        let bsdf = Bsdf::new(&si, 1.0);
        let v = vec3f!(0.3, -0.7, 0.2);
        let back = bsdf.local_to_world(bsdf.world_to_local(v));
        assert_abs_diff_eq!(back.x, v.x, epsilon = 1.0e-5);
        assert_abs_diff_eq!(back.y, v.y, epsilon = 1.0e-5);
        assert_abs_diff_eq!(back.z, v.z, epsilon = 1.0e-5);
        assert_abs_diff_eq!(bsdf.world_to_local(si.shading_n.0).z, 1.0, epsilon = 1.0e-5);
    }

    #[test]
    fn test_composite_pdf_and_f_are_consistent() {
        let si = tilted_interaction();
        let diffuse = LambertianReflection { r: Spectrum::uniform(0.4) };
        let glossy = MicrofacetReflection::new(
            Spectrum::uniform(1.0),
            TrowbridgeReitzDistribution::new(0.3, 0.3),
            FresnelDielectric::new(1.0, 1.5),
        );
        let mut bsdf = Bsdf::new(&si, 1.0);
        bsdf.add(&diffuse);
        bsdf.add(&glossy);

        let wo = vec3f!(0.2, 0.5, 0.8).normalize();
        let mut rng = Xoshiro256Plus::seed_from_u64(4);

        for _ in 0..500 {
            let s = match bsdf.sample_f(wo, Point2f::new(rng.gen(), rng.gen()), BxDFType::ALL) {
                Some(s) => s,
                None => continue,
            };
            assert_relative_eq!(s.pdf, bsdf.pdf(wo, s.wi, BxDFType::ALL), max_relative = 1.0e-2);
            let f = bsdf.f(wo, s.wi, BxDFType::ALL);
            assert_relative_eq!(s.f[1], f[1], max_relative = 1.0e-2, epsilon = 1.0e-5);
        }

        // the averaged pdf still integrates to one (minus what glossy loses below the horizon)
        let n = 200_000;
        let sum: f64 = (0..n).map(|_| {
            let wi = uniform_sample_sphere(Point2f::new(rng.gen(), rng.gen()));
            (bsdf.pdf(wo, wi, BxDFType::ALL) * 4.0 * PI) as f64
        }).sum();
        let integral = sum / n as f64;
        assert!(integral > 0.9 && integral < 1.03, "{}", integral);
    }

    #[test]
    fn test_flags_filter_lobes() {
        let si = tilted_interaction();
        let diffuse = LambertianReflection { r: Spectrum::uniform(0.4) };
        let mirror = SpecularReflection::new(Spectrum::uniform(1.0), FresnelNoOp);
        let mut bsdf = Bsdf::new(&si, 1.0);
        bsdf.add(&diffuse);
        bsdf.add(&mirror);

        assert_eq!(bsdf.num_components(BxDFType::ALL), 2);
        assert_eq!(bsdf.num_components(BxDFType::ALL & !BxDFType::SPECULAR), 1);

        let wo = si.shading_n.0;
        // the upper half of the first dimension selects the mirror
        let s = bsdf.sample_f(wo, Point2f::new(0.75, 0.5), BxDFType::ALL).expect("sample");
        assert!(s.is_delta());
        assert_abs_diff_eq!(s.pdf, 0.5);
        assert_abs_diff_eq!(s.wi.dot(wo), 1.0, epsilon = 1.0e-5);

        let s = bsdf.sample_f(wo, Point2f::new(0.25, 0.5), BxDFType::ALL).expect("sample");
        assert!(!s.is_delta());
    }

    #[test]
    fn test_transmission_direction_gets_no_reflection() {
        let si = tilted_interaction();
        let diffuse = LambertianReflection { r: Spectrum::uniform(0.4) };
        let mut bsdf = Bsdf::new(&si, 1.0);
        bsdf.add(&diffuse);
        let n = si.shading_n.0;
        assert!(bsdf.f(n, -n, BxDFType::ALL).is_black());
        assert!(!bsdf.f(n, n, BxDFType::ALL).is_black());
    }
}
