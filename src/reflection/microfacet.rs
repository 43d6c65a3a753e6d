use crate::{Vec3f, Float, Point2f, spherical_direction};
use crate::reflection::{tan2_theta, cos2_theta, cos2_phi, sin2_phi, tan_theta, same_hemisphere, abs_cos_theta};
use crate::consts::PI;

pub trait MicrofacetDistribution {
    /// Find the differential area of microfacets oriented with the given normal vector `w`
    fn d(&self, wh: Vec3f) -> Float;

    /// The Smith masking-shadowing function, giving the fraction of microfacets with normal `wh`
    /// that are visible from direction `w`. In most cases the probability a microfacet is visible
    /// is independent from its orientation so this function only depends on `w`.
    fn g1(&self, w: Vec3f) -> Float {
        1.0 / (1.0 + self.lambda(w))
    }

    /// Measures invisible masked microfacet area per visible microfacet area.
    fn lambda(&self, w: Vec3f) -> Float;

    /// Gives the fraction of microfacets in a differential area that are visible from both
    /// directions `wo` and `wi`.
    fn g(&self, wo: Vec3f, wi: Vec3f) -> Float {
        1.0 / (1.0 + self.lambda(wo) + self.lambda(wi))
    }

    /// Sample a microfacet normal in the hemisphere of `wo`, distributed as `d(wh) |cos(wh)|`.
    fn sample_wh(&self, wo: Vec3f, u: Point2f) -> Vec3f;

    fn pdf(&self, _wo: Vec3f, wh: Vec3f) -> Float {
        self.d(wh) * abs_cos_theta(wh)
    }
}

/// Also known as GGX
#[derive(Clone, Copy, Debug)]
pub struct TrowbridgeReitzDistribution {
    alpha_x: Float,
    alpha_y: Float,
}

impl TrowbridgeReitzDistribution {
    /// Map a perceptually linear roughness in [0, 1] to the distribution's alpha.
    pub fn roughness_to_alpha(roughness: Float) -> Float {
        let rough = roughness.max(1.0e-3);
        let x = rough.ln();
        1.62142 + 0.819955 * x + 0.1734 * x * x +
            0.0171201 * x * x * x + 0.000640711 * x * x * x * x
    }

    /// Alphas are clamped away from zero, where the distribution degenerates to a delta.
    pub fn new(alpha_x: Float, alpha_y: Float) -> Self {
        TrowbridgeReitzDistribution { alpha_x: alpha_x.max(1.0e-3), alpha_y: alpha_y.max(1.0e-3) }
    }
}

impl MicrofacetDistribution for TrowbridgeReitzDistribution {
    fn d(&self, wh: Vec3f) -> Float {
        let tan2_theta = tan2_theta(wh);
        if tan2_theta.is_infinite() || tan2_theta.is_nan() {
            return 0.0
        }

        let cos4_theta = cos2_theta(wh) * cos2_theta(wh);
        let e =
            (cos2_phi(wh) / (self.alpha_x * self.alpha_x) + sin2_phi(wh) / (self.alpha_y * self.alpha_y))
                * tan2_theta;
        1.0 / (PI * self.alpha_x * self.alpha_y * cos4_theta * (1.0 + e) * (1.0 + e))
    }

    fn lambda(&self, w: Vec3f) -> Float {
        let abs_tan_theta = tan_theta(w).abs();
        if abs_tan_theta.is_infinite() || abs_tan_theta.is_nan() {
            return 0.0
        }

        // compute alpha for direction w
        let alpha = Float::sqrt(cos2_phi(w) * self.alpha_x * self.alpha_x +
            sin2_phi(w) * self.alpha_y * self.alpha_y);

        let alpha2_tan2_theta = (alpha * abs_tan_theta) * (alpha * abs_tan_theta);
        (-1.0 + Float::sqrt(1.0 + alpha2_tan2_theta)) / 2.0
    }

    fn sample_wh(&self, wo: Vec3f, u: Point2f) -> Vec3f {
        // keep 1 - u away from zero so tan stays finite
        let u0 = u[0].min(1.0 - 1.0e-6);
        let (cos_theta, phi) = if self.alpha_x == self.alpha_y {
            let tan_theta2 = sq!(self.alpha_x) * u0 / (1.0 - u0);
            (1.0 / Float::sqrt(1.0 + tan_theta2), 2.0 * PI * u[1])
        } else {
            let mut phi = Float::atan(self.alpha_y / self.alpha_x * Float::tan(2.0 * PI * u[1] + 0.5 * PI));
            if u[1] > 0.5 {
                phi += PI;
            }
            let sin_phi = phi.sin();
            let cos_phi = phi.cos();
            let alpha2 = 1.0 / (sq!(cos_phi) / sq!(self.alpha_x) + sq!(sin_phi) / sq!(self.alpha_y));
            let tan_theta2 = alpha2 * u0 / (1.0 - u0);
            (1.0 / Float::sqrt(1.0 + tan_theta2), phi)
        };
        let sin_theta = Float::sqrt(Float::max(0.0, 1.0 - sq!(cos_theta)));
        let wh = spherical_direction(sin_theta, cos_theta, phi);
        if same_hemisphere(wo, wh) {
            wh
        } else {
            -wh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::uniform_sample_sphere;
    use approx::assert_abs_diff_eq;
    use cgmath::InnerSpace;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn test_projected_area_is_one() {
        // the projected microfacet area integrates to the macro surface area
        for (ax, ay) in [(0.2, 0.2), (0.5, 0.1), (0.8, 0.8)] {
            let distrib = TrowbridgeReitzDistribution::new(ax, ay);
            let mut rng = Xoshiro256Plus::seed_from_u64(1);
            let n = 400_000;
            let mut sum = 0.0f64;
            for _ in 0..n {
                let wh = uniform_sample_sphere(Point2f::new(rng.gen(), rng.gen()));
                if wh.z > 0.0 {
                    sum += (distrib.d(wh) * wh.z * 4.0 * PI) as f64;
                }
            }
            assert_abs_diff_eq!(sum / n as f64, 1.0, epsilon = 0.05);
        }
    }

    #[test]
    fn test_sampled_normals_face_wo() {
        let distrib = TrowbridgeReitzDistribution::new(0.3, 0.6);
        let mut rng = Xoshiro256Plus::seed_from_u64(2);
        let wo = vec3f!(0.1, 0.2, -1.0).normalize();
        for _ in 0..100 {
            let wh = distrib.sample_wh(wo, Point2f::new(rng.gen(), rng.gen()));
            assert!(wh.z < 0.0);
            assert_abs_diff_eq!(wh.magnitude(), 1.0, epsilon = 1.0e-4);
        }
    }

    #[test]
    fn test_masking_bounds() {
        let distrib = TrowbridgeReitzDistribution::new(0.5, 0.5);
        let w = vec3f!(0.6, 0.0, 0.8);
        assert!(distrib.g1(w) <= 1.0 && distrib.g1(w) > 0.0);
        assert_abs_diff_eq!(distrib.g1(vec3f!(0, 0, 1)), 1.0);
    }
}
