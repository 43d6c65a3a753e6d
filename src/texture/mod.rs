use crate::Point2f;
use std::sync::Arc;

pub mod checkerboard;
pub mod image;

pub use checkerboard::CheckerboardTexture;
pub use image::ImageTexture;

/// A function over surface (u, v) coordinates. Must be safe to evaluate from many workers.
pub trait Texture<T>: Send + Sync {
    fn evaluate(&self, uv: Point2f) -> T;
}

pub type TextureRef<T> = Arc<dyn Texture<T>>;

#[derive(Clone, Copy, Debug)]
pub struct ConstantTexture<T: Copy>(pub T);

impl<T: Copy + Send + Sync> Texture<T> for ConstantTexture<T> {
    fn evaluate(&self, _uv: Point2f) -> T {
        self.0
    }
}

/// Shorthand for a shared constant texture.
pub fn constant<T: Copy + Send + Sync + 'static>(value: T) -> TextureRef<T> {
    Arc::new(ConstantTexture(value))
}
