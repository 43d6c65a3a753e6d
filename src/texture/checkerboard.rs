use crate::texture::{Texture, TextureRef};
use crate::{Float, Point2f};

/// Alternates between two textures on a grid in (u, v) space.
pub struct CheckerboardTexture<T> {
    tex1: TextureRef<T>,
    tex2: TextureRef<T>,
    scale_u: Float,
    scale_v: Float,
}

impl<T> CheckerboardTexture<T> {
    /// `scale_u` and `scale_v` are the number of checks across the unit (u, v) square.
    pub fn new(tex1: TextureRef<T>, tex2: TextureRef<T>, scale_u: Float, scale_v: Float) -> Self {
        Self { tex1, tex2, scale_u, scale_v }
    }
}

impl<T> Texture<T> for CheckerboardTexture<T> {
    fn evaluate(&self, uv: Point2f) -> T {
        let s = (uv.x * self.scale_u).floor() as i64;
        let t = (uv.y * self.scale_v).floor() as i64;
        if (s + t).rem_euclid(2) == 0 {
            self.tex1.evaluate(uv)
        } else {
            self.tex2.evaluate(uv)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::constant;

    #[test]
    fn test_alternates() {
        let tex = CheckerboardTexture::new(constant(0.0), constant(1.0), 4.0, 4.0);
        assert_eq!(tex.evaluate(Point2f::new(0.1, 0.1)), 0.0);
        assert_eq!(tex.evaluate(Point2f::new(0.3, 0.1)), 1.0);
        assert_eq!(tex.evaluate(Point2f::new(0.3, 0.3)), 0.0);
        assert_eq!(tex.evaluate(Point2f::new(-0.1, 0.1)), 1.0);
    }
}
