use crate::texture::Texture;
use crate::spectrum::Spectrum;
use crate::{Float, Point2f};
use image::Rgb32FImage;

/// A texture backed by a linear floating point RGB image, looked up with nearest filtering and
/// repeat wrapping. (0, 0) is the top left of the image.
pub struct ImageTexture {
    image: Rgb32FImage,
}

impl ImageTexture {
    pub fn new(image: Rgb32FImage) -> Self {
        Self { image }
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

fn wrap(coord: Float, size: u32) -> u32 {
    let x = (coord * size as Float).floor() as i64;
    x.rem_euclid(size as i64) as u32
}

impl Texture<Spectrum> for ImageTexture {
    fn evaluate(&self, uv: Point2f) -> Spectrum {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return Spectrum::zero();
        }
        let px = self.image.get_pixel(wrap(uv.x, w), wrap(uv.y, h));
        Spectrum::from(px.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_lookup_wraps() {
        let mut img = Rgb32FImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([1.0, 0.0, 0.0]));
        img.put_pixel(1, 0, Rgb([0.0, 1.0, 0.0]));
        let tex = ImageTexture::new(img);
        assert_eq!(tex.evaluate(Point2f::new(0.25, 0.5)), Spectrum::rgb(1.0, 0.0, 0.0));
        assert_eq!(tex.evaluate(Point2f::new(0.75, 0.5)), Spectrum::rgb(0.0, 1.0, 0.0));
        assert_eq!(tex.evaluate(Point2f::new(1.25, 0.5)), Spectrum::rgb(1.0, 0.0, 0.0));
        assert_eq!(tex.evaluate(Point2f::new(-0.25, 0.5)), Spectrum::rgb(0.0, 1.0, 0.0));
    }
}
