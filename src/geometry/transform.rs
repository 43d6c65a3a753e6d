use crate::{Float, Point3f, Vec3f, Normal3, Bounds3f, Ray, ComponentWiseExt, Error};
use cgmath::{Matrix, Matrix4, SquareMatrix, InnerSpace, Transform as CgTransform, Rad, EuclideanSpace};
use crate::err_float::gamma;
use crate::interaction::{SurfaceHit, DiffGeom, SurfaceInteraction};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub t: Matrix4<Float>,
    pub invt: Matrix4<Float>
}

const IDENTITY_MAT4: Matrix4<Float> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0
);

impl Transform {

    pub const IDENTITY: Self = Transform::new(IDENTITY_MAT4, IDENTITY_MAT4);

    pub const fn new(mat: Matrix4<Float>, mat_inv: Matrix4<Float>) -> Self {
        Self { t: mat, invt: mat_inv }
    }

    /// The world-to-camera transform for a camera at `pos` looking towards `look_at`.
    pub fn look_at(pos: Point3f, look_at: Point3f, up: Vec3f) -> Result<Self, Error> {
        let dir = (look_at - pos).normalize();
        let right = up.normalize().cross(dir);
        if !right.is_finite() || right.magnitude2() == 0.0 {
            return Err(Error::InvalidParameter {
                what: "look_at",
                reason: "up vector and viewing direction are parallel".into(),
            });
        }
        let right = right.normalize();
        let new_up = dir.cross(right);

        let col0 = right.extend(0.0);
        let col1 = new_up.extend(0.0);
        let col2 = dir.extend(0.0);
        let col3 = pos.to_homogeneous();

        let mat = Matrix4::from_cols(col0, col1, col2, col3);
        let minv = mat.inverse_transform().ok_or_else(|| Error::InvalidParameter {
            what: "look_at",
            reason: "camera frame is not invertible".into(),
        })?;
        Ok(Self::new(minv, mat))
    }

    /// The camera-to-world transform for a camera at `pos` looking towards `look_at`.
    pub fn camera_look_at(pos: Point3f, look_at: Point3f, up: Vec3f) -> Result<Self, Error> {
        Ok(Self::look_at(pos, look_at, up)?.inverse())
    }

    pub fn translate(delta: Vec3f) -> Self {
        let m = Matrix4::from_translation(delta);
        let m_inv = Matrix4::from_translation(-delta);
        Self::new(m, m_inv)
    }

    pub fn scale(sx: Float, sy: Float, sz: Float) -> Self {
        let m = Matrix4::from_nonuniform_scale(sx, sy, sz);
        let m_inv = Matrix4::from_nonuniform_scale(1.0 / sx, 1.0 / sy, 1.0 / sz);
        Self::new(m, m_inv)
    }

    pub fn rotate_x(theta: impl Into<Rad<Float>>) -> Self {
        let m = Matrix4::from_angle_x(theta);
        // rotations are orthogonal
        Self::new(m, m.transpose())
    }

    pub fn perspective(fov: Float, near: Float, far: Float) -> Self {
        let a = far / (far - near);
        let b = -far * near / (far - near);
        // column-major
        let mat = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, a, 1.0,
            0.0, 0.0, b, 0.0
        );
        let mat_inv = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0 / b,
            0.0, 0.0, 1.0, -a / b
        );

        let inv_tan_ang = 1.0 / (fov.to_radians() / 2.0).tan();
        Transform::scale(inv_tan_ang, inv_tan_ang, 1.0) * Self::new(mat, mat_inv)
    }

    pub fn orthographic(near: Float, far: Float) -> Self {
        Transform::scale(1.0, 1.0, 1.0 / (far - near)) * Transform::translate(Vec3f::new(0.0, 0.0, -near))
    }

    pub fn inverse(&self) -> Self {
        Self::new(self.invt, self.t)
    }

    pub fn then(self, next: Self) -> Self {
        next * self
    }

    pub fn transform_normal(&self, n: &Normal3) -> Normal3 {
        // transform by the transpose of the inverse
        let x = self.invt[0][0]*n.x + self.invt[0][1]*n.y + self.invt[0][2]*n.z;
        let y = self.invt[1][0]*n.x + self.invt[1][1]*n.y + self.invt[1][2]*n.z;
        let z = self.invt[2][0]*n.x + self.invt[2][1]*n.y + self.invt[2][2]*n.z;
        Normal3(vec3f!(x, y, z))
    }

    pub fn transform<T: Transformable>(&self, obj: T) -> T {
        obj.transform(*self)
    }

    pub fn tf_exact_to_err<T: TransformableErr>(&self, obj: T) -> (T, T::Err) {
        obj.tf_exact_to_err(*self)
    }

    pub fn tf_err_to_err<T: TransformableErr>(&self, obj: T, err: T::Err) -> (T, T::Err) {
        obj.tf_err_to_err(err, *self)
    }
}

impl std::ops::Mul for Transform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.t * rhs.t, rhs.invt * self.invt)
    }
}

pub trait Transformable: Sized {
    fn transform(&self, t: Transform) -> Self;
}

/// Transformations that also track a conservative bound on the floating point error they
/// introduce.
pub trait TransformableErr: Transformable {
    type Err;

    fn tf_exact_to_err(&self, t: Transform) -> (Self, Self::Err);

    fn tf_err_to_err(&self, err: Self::Err, t: Transform) -> (Self, Self::Err);
}

impl Transformable for Vec3f {
    fn transform(&self, t: Transform) -> Self {
        t.t.transform_vector(*self)
    }
}

impl TransformableErr for Vec3f {
    type Err = Vec3f;

    fn tf_exact_to_err(&self, tf: Transform) -> (Self, Self::Err) {
        let vt = tf.t.transform_vector(*self);
        let m = tf.t;
        let x = self.x;
        let y = self.y;
        let z = self.z;

        let x_abs_sum = (m[0][0] * x).abs() + (m[1][0] * y).abs() + (m[2][0] * z).abs();
        let y_abs_sum = (m[0][1] * x).abs() + (m[1][1] * y).abs() + (m[2][1] * z).abs();
        let z_abs_sum = (m[0][2] * x).abs() + (m[1][2] * y).abs() + (m[2][2] * z).abs();

        let v_error = vec3f!(x_abs_sum, y_abs_sum, z_abs_sum) * gamma(3);
        (vt, v_error)
    }

    fn tf_err_to_err(&self, verr: Self::Err, tf: Transform) -> (Self, Self::Err) {
        let (vt, exact_err) = self.tf_exact_to_err(tf);
        let m = tf.t;

        let xerr = (gamma(3) + 1.0) *
            ((m[0][0] * verr.x).abs() + (m[1][0] * verr.y).abs() + (m[2][0] * verr.z).abs());
        let yerr = (gamma(3) + 1.0) *
            ((m[0][1] * verr.x).abs() + (m[1][1] * verr.y).abs() + (m[2][1] * verr.z).abs());
        let zerr = (gamma(3) + 1.0) *
            ((m[0][2] * verr.x).abs() + (m[1][2] * verr.y).abs() + (m[2][2] * verr.z).abs());

        (vt, vec3f!(xerr, yerr, zerr) + exact_err)
    }
}

impl Transformable for Point3f {
    fn transform(&self, t: Transform) -> Self { t.t.transform_point(*self) }
}

impl TransformableErr for Point3f {
    type Err = Vec3f;

    fn tf_exact_to_err(&self, tf: Transform) -> (Self, Self::Err) {
        let pt = tf.t.transform_point(*self);
        let m = tf.t;
        let x = self.x;
        let y = self.y;
        let z = self.z;

        let x_abs_sum = (m[0][0] * x).abs() + (m[1][0] * y).abs() + (m[2][0] * z).abs() + m[3][0].abs();
        let y_abs_sum = (m[0][1] * x).abs() + (m[1][1] * y).abs() + (m[2][1] * z).abs() + m[3][1].abs();
        let z_abs_sum = (m[0][2] * x).abs() + (m[1][2] * y).abs() + (m[2][2] * z).abs() + m[3][2].abs();

        let p_error = vec3f!(x_abs_sum, y_abs_sum, z_abs_sum) * gamma(3);
        (pt, p_error)
    }

    fn tf_err_to_err(&self, perr: Self::Err, tf: Transform) -> (Self, Self::Err) {
        let (pt, exact_err) = self.tf_exact_to_err(tf);
        let m = tf.t;

        let xerr = (gamma(3) + 1.0) *
            (m[0][0].abs() * perr.x + m[1][0].abs() * perr.y + m[2][0].abs() * perr.z);
        let yerr = (gamma(3) + 1.0) *
            (m[0][1].abs() * perr.x + m[1][1].abs() * perr.y + m[2][1].abs() * perr.z);
        let zerr = (gamma(3) + 1.0) *
            (m[0][2].abs() * perr.x + m[1][2].abs() * perr.y + m[2][2].abs() * perr.z);

        (pt, vec3f!(xerr, yerr, zerr) + exact_err)
    }
}

impl Transformable for Normal3 {
    fn transform(&self, t: Transform) -> Self {
        t.transform_normal(self)
    }
}

impl Transformable for Bounds3f {
    fn transform(&self, t: Transform) -> Self {
        let (lo, hi) = (self.min, self.max);
        let corners = [
            Point3f::new(lo.x, lo.y, lo.z),
            Point3f::new(hi.x, lo.y, lo.z),
            Point3f::new(lo.x, hi.y, lo.z),
            Point3f::new(lo.x, lo.y, hi.z),
            Point3f::new(hi.x, hi.y, lo.z),
            Point3f::new(hi.x, lo.y, hi.z),
            Point3f::new(lo.x, hi.y, hi.z),
            Point3f::new(hi.x, hi.y, hi.z),
        ];
        corners.iter().fold(Bounds3f::empty(), |b, p| b.join_point(&t.transform(*p)))
    }
}

impl TransformableErr for Ray {
    type Err = (Vec3f, Vec3f);

    fn tf_exact_to_err(&self, t: Transform) -> (Self, Self::Err) {
        let (mut ot, o_err) = t.tf_exact_to_err(self.origin);
        let (dir_t, dir_err) = t.tf_exact_to_err(self.dir);
        let mut t_max = self.t_max;

        let len_sq = dir_t.magnitude2();
        if len_sq > 0.0 {
            let dt = dir_t.abs().dot(o_err) / len_sq;
            ot += dir_t * dt;
            t_max -= dt;
        }
        let ray_t = Ray { origin: ot, dir: dir_t, t_max, ..*self };
        (ray_t, (o_err, dir_err))
    }

    fn tf_err_to_err(&self, (o_err_in, d_err_in): Self::Err, t: Transform) -> (Self, Self::Err) {
        let (mut ot, o_err) = t.tf_err_to_err(self.origin, o_err_in);
        let (dir_t, dir_err) = t.tf_err_to_err(self.dir, d_err_in);
        let mut t_max = self.t_max;

        let len_sq = dir_t.magnitude2();
        if len_sq > 0.0 {
            let dt = dir_t.abs().dot(o_err) / len_sq;
            ot += dir_t * dt;
            t_max -= dt;
        }
        let ray_t = Ray { origin: ot, dir: dir_t, t_max, ..*self };
        (ray_t, (o_err, dir_err))
    }
}

impl Transformable for Ray {
    fn transform(&self, t: Transform) -> Ray {
        let (ray, _) = self.tf_exact_to_err(t);
        ray
    }
}

impl Transformable for SurfaceHit {
    fn transform(&self, t: Transform) -> Self {
        let (pt, pterr) = t.tf_err_to_err(self.p, self.p_err);
        let n = if self.n.is_zero() { self.n } else { t.transform(self.n).normalize() };
        SurfaceHit { p: pt, p_err: pterr, time: self.time, n }
    }
}

impl Transformable for DiffGeom {
    fn transform(&self, t: Transform) -> Self {
        Self {
            dpdu: self.dpdu.transform(t),
            dpdv: self.dpdv.transform(t),
            dndu: self.dndu.transform(t),
            dndv: self.dndv.transform(t)
        }
    }
}

impl Transformable for SurfaceInteraction {
    fn transform(&self, t: Transform) -> Self {
        let hit = self.hit.transform(t);
        let shading_n = t.transform(self.shading_n).normalize().faceforward(hit.n.0);
        Self {
            hit,
            uv: self.uv,
            wo: t.transform(self.wo).normalize(),
            geom: self.geom.transform(t),

            shading_n,
            shading_geom: self.shading_geom.transform(t),
        }
    }
}
