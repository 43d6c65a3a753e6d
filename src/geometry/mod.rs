use crate::{Vec3f, Point3f, Float};
use cgmath::prelude::*;
use std::ops::{Deref, Neg};

pub mod bounds;
pub mod transform;

pub use bounds::*;
pub use transform::*;
pub use transform::Transform;
use crate::err_float::{next_float_up, next_float_down};

pub fn distance(p1: Point3f, p2: Point3f) -> Float {
    (p1 - p2).magnitude()
}

pub fn abs_dot(v1: Vec3f, v2: Vec3f) -> Float {
    v1.dot(v2).abs()
}

/// Flip `v` so that it lies in the same hemisphere as `v2`.
pub fn faceforward(v: Vec3f, v2: Vec3f) -> Vec3f {
    if v.dot(v2) < 0.0 { -v } else { v }
}

pub fn spherical_direction(sin_theta: Float, cos_theta: Float, phi: Float) -> Vec3f {
    Vec3f::new(
        sin_theta.clamp(-1.0, 1.0) * phi.cos(),
        sin_theta.clamp(-1.0, 1.0) * phi.sin(),
        cos_theta.clamp(-1.0, 1.0),
    )
}

/// Like `spherical_direction` but expressed in the frame given by the basis `x`, `y`, `z`.
pub fn spherical_direction_in(
    sin_theta: Float,
    cos_theta: Float,
    phi: Float,
    x: Vec3f,
    y: Vec3f,
    z: Vec3f,
) -> Vec3f {
    sin_theta * phi.cos() * x + sin_theta * phi.sin() * y + cos_theta * z
}

pub fn spherical_theta(v: Vec3f) -> Float {
    v.z.clamp(-1.0, 1.0).acos()
}

pub fn spherical_phi(v: Vec3f) -> Float {
    let p = v.y.atan2(v.x);
    if p < 0.0 { p + 2.0 * crate::consts::PI } else { p }
}

/// Construct two vectors that together with the normalized vector `v1` form an orthonormal basis.
pub fn coordinate_system(v1: Vec3f) -> (Vec3f, Vec3f) {
    let v2 = if v1.x.abs() > v1.y.abs() {
        Vec3f::new(-v1.z, 0.0, v1.x) / (v1.x * v1.x + v1.z * v1.z).sqrt()
    } else {
        Vec3f::new(0.0, v1.z, -v1.y) / (v1.y * v1.y + v1.z * v1.z).sqrt()
    };
    let v3 = v1.cross(v2);
    (v2, v3)
}

pub fn max_dimension(v: Vec3f) -> usize {
    if v.x > v.y {
        if v.x > v.z { 0 } else { 2 }
    } else if v.y > v.z {
        1
    } else {
        2
    }
}

pub fn permute_vec(v: Vec3f, x: usize, y: usize, z: usize) -> Vec3f {
    Vec3f::new(v[x], v[y], v[z])
}

pub fn permute_point(p: Point3f, x: usize, y: usize, z: usize) -> Point3f {
    Point3f::new(p[x], p[y], p[z])
}

pub trait ComponentWiseExt {
    fn abs(self) -> Self;

    fn max_component(self) -> Float;

    fn is_finite(self) -> bool;
}

impl ComponentWiseExt for Vec3f {
    fn abs(self) -> Self {
        self.map(|c| c.abs())
    }

    fn max_component(self) -> Float {
        self.x.max(self.y).max(self.z)
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl ComponentWiseExt for Point3f {
    fn abs(self) -> Self {
        self.map(|c| c.abs())
    }

    fn max_component(self) -> Float {
        self.x.max(self.y).max(self.z)
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Offset a ray origin along the surface normal by the conservative error bound `p_err`, so
/// that a ray spawned in direction `dir` cannot re-intersect the surface it left.
pub fn offset_ray_origin(p: Point3f, p_err: Vec3f, n: Normal3, dir: Vec3f) -> Point3f {
    let d = n.abs().dot(p_err);
    let mut offset = d * n.0;
    if dir.dot(n.0) < 0.0 {
        offset = -offset;
    }
    let mut po: Point3f = p + offset;
    for i in 0..3 {
        if offset[i] > 0.0 { po[i] = next_float_up(po[i]) }
        else if offset[i] < 0.0 { po[i] = next_float_down(po[i]) }
    }

    po
}

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Point3f,
    pub dir: Vec3f,
    pub t_min: Float,
    pub t_max: Float,
    pub time: Float,
}

impl Ray {
    pub fn new(origin: Point3f, dir: Vec3f) -> Self {
        Self {
            origin, dir, t_min: 0.0, t_max: Float::INFINITY, time: 0.0
        }
    }

    pub fn segment(origin: Point3f, dir: Vec3f, t_max: Float) -> Self {
        Self { t_max, ..Self::new(origin, dir) }
    }

    pub fn at(&self, t: Float) -> Point3f {
        self.origin + (self.dir * t)
    }

    /// A copy of this ray whose parametric range ends at `t_max`.
    pub fn clipped(&self, t_max: Float) -> Self {
        Self { t_max, ..*self }
    }
}


#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Normal3(pub Vec3f);

impl Normal3 {
    pub fn new(x: Float, y: Float, z: Float) -> Self {
        Self(Vec3f::new(x, y, z))
    }

    pub fn zero() -> Self {
        Self(Vec3f::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Vec3f::zero()
    }

    pub fn faceforward(self, v: Vec3f) -> Self {
        if self.dot(v) < 0.0 {
            Self(-self.0)
        } else {
            self
        }
    }

    pub fn normalize(self) -> Self {
        Self(self.0.normalize())
    }
}

impl Deref for Normal3 {
    type Target = Vec3f;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Neg for Normal3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl From<Vec3f> for Normal3 {
    fn from(v: Vec3f) -> Self {
        Self(v)
    }
}

impl From<Normal3> for Vec3f {
    fn from(n: Normal3) -> Self {
        n.0
    }
}
