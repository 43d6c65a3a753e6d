use crate::{Point2f, Vec2f, Vec3f, Float};
use crate::consts::{PI, FRAC_PI_2, FRAC_PI_4, FRAC_1_PI, INV_4_PI};
use crate::math::find_interval;

pub fn concentric_sample_disk(u: Point2f) -> Point2f {
    // map sample from [0, 1] to [-1, 1]
    let u_offset = 2.0 * u - Vec2f::new(1.0, 1.0);
    if u_offset == Point2f::new(0.0, 0.0) {
        return Point2f::new(0.0, 0.0);
    }

    let (r, theta) = if u_offset.x.abs() > u_offset.y.abs() {
        (u_offset.x, FRAC_PI_4 * (u_offset.y / u_offset.x))
    } else {
        (u_offset.y, FRAC_PI_2 - FRAC_PI_4 * (u_offset.x / u_offset.y))
    };

    r * Point2f::new(theta.cos(), theta.sin())
}

pub fn cosine_sample_hemisphere(u: Point2f) -> Vec3f {
    let d = concentric_sample_disk(u);
    let z = Float::sqrt(Float::max(0.0, 1.0 - d.x * d.x - d.y * d.y));
    Vec3f::new(d.x, d.y, z)
}

pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * FRAC_1_PI
}

pub fn uniform_sample_sphere(u: Point2f) -> Vec3f {
    let z = 1.0 - 2.0 * u[0];
    let r = Float::sqrt(Float::max(0.0, 1.0 - z * z));
    let phi = 2.0 * PI * u[1];
    Vec3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn uniform_sphere_pdf() -> Float {
    INV_4_PI
}

/// Uniformly sample barycentric coordinates of a triangle.
pub fn uniform_sample_triangle(u: Point2f) -> Point2f {
    let su0 = u[0].sqrt();
    Point2f::new(1.0 - su0, u[1] * su0)
}

pub fn power_heuristic(nf: u32, f_pdf: Float, ng: u32, g_pdf: Float) -> Float {
    let f = nf as Float * f_pdf;
    let g = ng as Float * g_pdf;
    if f.is_infinite() { return 1.0; }
    let denom = f * f + g * g;
    if denom == 0.0 { 0.0 } else { (f * f) / denom }
}

pub fn balance_heuristic(nf: u32, f_pdf: Float, ng: u32, g_pdf: Float) -> Float {
    let f = nf as Float * f_pdf;
    let g = ng as Float * g_pdf;
    if f.is_infinite() { return 1.0; }
    let denom = f + g;
    if denom == 0.0 { 0.0 } else { f / denom }
}

/// A piecewise-constant 1D distribution over [0, 1] built from a tabulated function.
#[derive(Clone, Debug)]
pub struct Distribution1D {
    func: Vec<Float>,
    cdf: Vec<Float>,
    func_int: Float,
}

impl Distribution1D {
    /// Negative or non-finite entries are treated as zero. If the function integrates to zero
    /// the distribution falls back to uniform.
    pub fn new(func: &[Float]) -> Self {
        let func: Vec<Float> = func.iter()
            .map(|&f| if f.is_finite() && f > 0.0 { f } else { 0.0 })
            .collect();
        let n = func.len();
        let mut cdf = vec![0.0; n + 1];
        for i in 1..=n {
            cdf[i] = cdf[i - 1] + func[i - 1] / n as Float;
        }

        let func_int = cdf[n];
        if func_int == 0.0 {
            for (i, c) in cdf.iter_mut().enumerate().skip(1) {
                *c = i as Float / n as Float;
            }
        } else {
            for c in cdf.iter_mut().skip(1) {
                *c /= func_int;
            }
        }

        Self { func, cdf, func_int }
    }

    pub fn count(&self) -> usize {
        self.func.len()
    }

    pub fn func_int(&self) -> Float {
        self.func_int
    }

    fn offset_for(&self, u: Float) -> usize {
        find_interval(self.cdf.len(), |i| self.cdf[i] <= u)
    }

    /// Returns the sampled position in [0, 1), its density and the segment it fell in.
    pub fn sample_continuous(&self, u: Float) -> (Float, Float, usize) {
        let offset = self.offset_for(u);
        let mut du = u - self.cdf[offset];
        let width = self.cdf[offset + 1] - self.cdf[offset];
        if width > 0.0 {
            du /= width;
        }

        let pdf = if self.func_int > 0.0 { self.func[offset] / self.func_int } else { 1.0 };
        let x = (offset as Float + du) / self.count() as Float;
        (x.min(1.0 - Float::EPSILON), pdf, offset)
    }

    /// Returns the sampled index and its discrete probability.
    pub fn sample_discrete(&self, u: Float) -> (usize, Float) {
        let offset = self.offset_for(u);
        (offset, self.discrete_pdf(offset))
    }

    pub fn discrete_pdf(&self, index: usize) -> Float {
        match self.func.get(index) {
            Some(&f) if self.func_int > 0.0 => f / (self.func_int * self.count() as Float),
            Some(_) => 1.0 / self.count() as Float,
            None => 0.0,
        }
    }
}

/// A piecewise-constant 2D distribution over [0, 1]², sampled marginal-first in v.
#[derive(Clone, Debug)]
pub struct Distribution2D {
    conditional: Vec<Distribution1D>,
    marginal: Distribution1D,
}

impl Distribution2D {
    /// `func` holds `nv` rows of `nu` values each.
    pub fn new(func: &[Float], nu: usize, nv: usize) -> Self {
        let conditional: Vec<_> = func.chunks(nu)
            .take(nv)
            .map(Distribution1D::new)
            .collect();
        let marginal_func: Vec<_> = conditional.iter().map(|d| d.func_int()).collect();
        let marginal = Distribution1D::new(&marginal_func);
        Self { conditional, marginal }
    }

    pub fn sample_continuous(&self, u: Point2f) -> (Point2f, Float) {
        let (d1, pdf1, v) = self.marginal.sample_continuous(u[1]);
        let (d0, pdf0, _) = self.conditional[v].sample_continuous(u[0]);
        (Point2f::new(d0, d1), pdf0 * pdf1)
    }

    pub fn pdf(&self, p: Point2f) -> Float {
        let nu = self.conditional[0].count();
        let nv = self.marginal.count();
        let iu = ((p[0] * nu as Float) as usize).min(nu - 1);
        let iv = ((p[1] * nv as Float) as usize).min(nv - 1);
        if self.marginal.func_int() == 0.0 {
            return 1.0;
        }
        self.conditional[iv].func[iu] / self.marginal.func_int()
    }
}
