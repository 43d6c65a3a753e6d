#[macro_use] pub mod macros; // must stay at the top
pub mod math;
pub mod err_float;
pub mod geometry;
pub mod spectrum;
pub mod sampling;
pub mod sampler;
pub mod camera;
pub mod texture;
pub mod interaction;
pub mod shapes;
pub mod entity;
pub mod bvh;
pub mod scene;
pub mod light;
pub mod fresnel;
pub mod reflection;
pub mod material;
pub mod medium;
pub mod integrator;
pub mod film;
pub mod progress;
pub mod renderer;
pub mod settings;
pub mod error;
pub mod demo;

pub use geometry::*;
pub use err_float::EFloat;
pub use interaction::{SurfaceHit, SurfaceInteraction};
pub use error::{Error, RenderError};

use cgmath::{Point2, Point3, Vector2, Vector3};
use std::fmt::Debug;

pub type Float = f32;

pub type Point2f = Point2<Float>;
pub type Point2i = Point2<i32>;
pub type Point3f = Point3<Float>;
pub type Vec2f = Vector2<Float>;
pub type Vec2i = Vector2<i32>;
pub type Vec3f = Vector3<Float>;

pub mod consts {
    pub use std::f32::consts::*;

    pub const INV_2_PI: f32 = 0.5 * FRAC_1_PI;
    pub const INV_4_PI: f32 = 0.25 * FRAC_1_PI;
}

pub trait Scalar: cgmath::BaseNum + num::Bounded + Debug {
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
}

impl Scalar for f32 {
    fn min(self, other: Self) -> Self {
        self.min(other)
    }

    fn max(self, other: Self) -> Self {
        self.max(other)
    }
}

impl Scalar for i32 {
    fn min(self, other: Self) -> Self {
        Ord::min(self, other)
    }

    fn max(self, other: Self) -> Self {
        Ord::max(self, other)
    }
}
